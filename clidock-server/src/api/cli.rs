//! CLI API Handlers
//!
//! Per-CLI endpoints resolved through the route registry:
//! the raw XML schema, the REST parameter sheet, and task compilation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use clidock_core::domain::task::{CompiledTask, RequestValues};
use clidock_core::dto::cli::{CliSummary, ParameterSheet};
use clidock_schema::{RouteRegistry, RunHandler};

use crate::api::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Image name behind a REST path segment
fn resolve_image(registry: &RouteRegistry, rest_path: &str) -> ApiResult<String> {
    registry
        .resolve_rest_path(rest_path)
        .map(str::to_string)
        .ok_or_else(|| ApiError::NotFound(format!("No image registered under '{}'", rest_path)))
}

fn run_handler(registry: &RouteRegistry, rest_path: &str, cli: &str) -> ApiResult<Arc<RunHandler>> {
    let image = resolve_image(registry, rest_path)?;
    registry
        .run_handler(&image, cli)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("CLI {} not found in image {}", cli, image)))
}

/// GET /cli
/// List every registered CLI with its relative route
pub async fn list_clis(State(state): State<SharedState>) -> Json<Vec<CliSummary>> {
    tracing::debug!("Listing registered CLIs");
    Json(state.registry().summaries())
}

/// GET /cli/{rest_path}/{cli}/xmlspec
/// Raw XML schema of a CLI
pub async fn get_xml_spec(
    State(state): State<SharedState>,
    Path((rest_path, cli)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry();
    let image = resolve_image(&registry, &rest_path)?;

    let xml = registry
        .xml_spec(&image, &cli)
        .ok_or_else(|| ApiError::NotFound(format!("CLI {} not found in image {}", cli, image)))?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml.to_string()))
}

/// GET /cli/{rest_path}/{cli}/parameters
/// REST parameters accepted by a CLI's run endpoint
pub async fn get_parameters(
    State(state): State<SharedState>,
    Path((rest_path, cli)): Path<(String, String)>,
) -> ApiResult<Json<ParameterSheet>> {
    let handler = run_handler(&state.registry(), &rest_path, &cli)?;
    Ok(Json(handler.sheet()))
}

/// POST /cli/{rest_path}/{cli}/run
/// Compile an invocation request into a task specification
///
/// The compiled task is returned, not scheduled.
pub async fn run_cli(
    State(state): State<SharedState>,
    Path((rest_path, cli)): Path<(String, String)>,
    Json(values): Json<RequestValues>,
) -> ApiResult<Json<CompiledTask>> {
    let handler = run_handler(&state.registry(), &rest_path, &cli)?;

    tracing::info!(
        "Compiling task for CLI {} of image {}",
        handler.cli(),
        handler.image()
    );

    let compiled = handler.compile(&values, state.options())?;
    Ok(Json(compiled))
}
