//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod cli;
pub mod error;
pub mod health;
pub mod images;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

/// Create the main API router with all endpoints
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Image endpoints
        .route("/images/ingest", post(images::ingest_images))
        .route(
            "/images",
            get(images::list_images).delete(images::delete_images),
        )
        // CLI endpoints
        .route("/cli", get(cli::list_clis))
        .route("/cli/{rest_path}/{cli}/xmlspec", get(cli::get_xml_spec))
        .route("/cli/{rest_path}/{cli}/parameters", get(cli::get_parameters))
        .route("/cli/{rest_path}/{cli}/run", post(cli::run_cli))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
