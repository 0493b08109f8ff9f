//! Image API Handlers
//!
//! HTTP endpoints for image ingestion, removal and listing.

use axum::{Json, extract::State};
use clidock_core::dto::ingestion::{IngestionRequest, JobReport, RemovalRequest};

use crate::api::error::{ApiError, ApiResult};
use crate::service::catalog_service::{self, CatalogError, ImageListing};
use crate::state::SharedState;

fn api_error(err: CatalogError) -> ApiError {
    match err {
        CatalogError::ValidationError(msg) => ApiError::BadRequest(msg),
        CatalogError::RuntimeUnavailable { message, report } => {
            ApiError::JobAborted { message, report }
        }
        CatalogError::InternalError(msg) => ApiError::InternalError(msg),
    }
}

/// POST /images/ingest
/// Pull and/or load images and cache the metadata of their CLIs
pub async fn ingest_images(
    State(state): State<SharedState>,
    Json(req): Json<IngestionRequest>,
) -> ApiResult<Json<JobReport>> {
    tracing::info!(
        "Ingesting images: pull={:?}, load={:?}",
        req.pull_list,
        req.load_list
    );

    let outcome = catalog_service::ingest_images(&state, req)
        .await
        .map_err(api_error)?;

    Ok(Json(JobReport::from(outcome)))
}

/// DELETE /images
/// Force-remove local images and evict them from the cache
pub async fn delete_images(
    State(state): State<SharedState>,
    Json(req): Json<RemovalRequest>,
) -> ApiResult<Json<JobReport>> {
    tracing::info!("Removing images: {:?}", req.delete_list);

    let outcome = catalog_service::remove_images(&state, req.delete_list)
        .await
        .map_err(api_error)?;

    Ok(Json(JobReport::from(outcome)))
}

/// GET /images
/// List cached images with their CLIs
pub async fn list_images(State(state): State<SharedState>) -> Json<Vec<ImageListing>> {
    tracing::debug!("Listing cached images");
    Json(catalog_service::list_images(&state))
}
