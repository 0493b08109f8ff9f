//! Health API Handler
//!
//! Liveness plus a summary of what the server can currently compile.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    /// Images in the metadata cache
    pub images: usize,
    /// CLI routes currently served
    pub routes: usize,
    /// Cached CLIs whose schema did not build a route
    pub failed_clis: usize,
}

/// GET /health
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthReport> {
    let images = state.read_cache().len();
    let registry = state.registry();

    Json(HealthReport {
        status: "ok",
        images,
        routes: registry.len(),
        failed_clis: registry.failures().len(),
    })
}
