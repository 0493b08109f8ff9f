//! Clidock Server
//!
//! HTTP surface for containerized CLIs:
//! - Ingestion: pull/load images and cache the XML schemas of their CLIs
//! - Removal: force-remove images and evict them from the cache
//! - Per-CLI routes: raw XML schema, REST parameters, task compilation
//!
//! Compiled tasks are returned to the caller; scheduling them is the job of
//! an external execution engine.

mod api;
mod config;
mod service;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clidock_core::dto::ingestion::IngestionRequest;
use clidock_runner::{CliContainerRunner, ImageIngestionPipeline, RunnerConfig, TracingLogSink};
use clidock_schema::CompileOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::service::catalog_service;
use crate::state::{AppState, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clidock_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Clidock Server...");

    let runner_config = RunnerConfig::from_env().context("Invalid runner configuration")?;
    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    info!(
        "Loaded configuration: engine={}, bind_addr={}, data_dir={}",
        runner_config.engine, server_config.bind_addr, server_config.data_dir
    );

    let runner = Arc::new(CliContainerRunner::from_config(&runner_config));
    let pipeline = ImageIngestionPipeline::new(runner, &runner_config, Arc::new(TracingLogSink));
    let options = CompileOptions {
        data_dir: server_config.data_dir.clone(),
    };
    let state: SharedState = Arc::new(AppState::new(pipeline, options));

    load_initial_images(&state, &server_config).await;

    // Build router with all API endpoints
    let app = api::create_router(state);

    info!("Listening on {}", server_config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

/// Ingests the configured local images before serving
///
/// A failed startup load is logged; the server still starts with whatever
/// was cached.
async fn load_initial_images(state: &SharedState, config: &ServerConfig) {
    if config.load_images.is_empty() {
        return;
    }

    info!("Loading {} image(s) at startup", config.load_images.len());
    let req = IngestionRequest {
        pull_list: Vec::new(),
        load_list: config.load_images.clone(),
    };

    match catalog_service::ingest_images(state, req).await {
        Ok(outcome) if outcome.is_success() => {
            info!("Loaded {} image(s) at startup", outcome.cache.len());
        }
        Ok(outcome) => {
            warn!(
                "Startup load finished with status {}: {} failure(s)",
                outcome.status(),
                outcome.failures.len()
            );
        }
        Err(e) => warn!("Startup load failed: {:?}", e),
    }
}
