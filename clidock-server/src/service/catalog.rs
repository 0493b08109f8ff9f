//! Catalog Service
//!
//! Ingestion and removal of images, and queries over the cached metadata.

use clidock_core::domain::ingestion::{IngestionOutcome, JobAborted, RemovalOutcome};
use clidock_core::dto::ingestion::{IngestionRequest, JobReport};
use serde::Serialize;

use crate::state::SharedState;

/// Service error type
#[derive(Debug)]
pub enum CatalogError {
    ValidationError(String),
    /// The engine went away; the job was finished as `ERROR`
    RuntimeUnavailable {
        message: String,
        report: Box<JobReport>,
    },
    InternalError(String),
}

impl From<JobAborted> for CatalogError {
    fn from(aborted: JobAborted) -> Self {
        if aborted.is_fatal() {
            CatalogError::RuntimeUnavailable {
                message: aborted.error.to_string(),
                report: Box::new(JobReport::from(aborted)),
            }
        } else {
            CatalogError::InternalError(aborted.to_string())
        }
    }
}

/// Cached image with the CLIs it exposes
#[derive(Debug, Clone, Serialize)]
pub struct ImageListing {
    pub name: String,
    pub clis: Vec<CliListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CliListing {
    pub name: String,
    #[serde(rename = "type")]
    pub cli_type: String,
}

/// Run an ingestion job and publish what it produced
///
/// Images are published whole; images absent from the outcome keep their
/// previous records.
pub async fn ingest_images(
    state: &SharedState,
    req: IngestionRequest,
) -> Result<IngestionOutcome, CatalogError> {
    if req.is_empty() {
        return Err(CatalogError::ValidationError(
            "pullList and loadList cannot both be empty".to_string(),
        ));
    }

    let pipeline = state.pipeline();
    let outcome = tokio::task::spawn_blocking(move || pipeline.ingest(&req))
        .await
        .map_err(|e| CatalogError::InternalError(format!("ingestion task failed: {}", e)))??;

    let published = state.update_cache(|cache| cache.publish(outcome.cache.clone()));

    tracing::info!(
        "Ingestion job {} finished with status {}, published: {:?}",
        outcome.job.id,
        outcome.job.status,
        published
    );

    Ok(outcome)
}

/// Run a removal job and evict the removed images
pub async fn remove_images(
    state: &SharedState,
    images: Vec<String>,
) -> Result<RemovalOutcome, CatalogError> {
    if images.is_empty() {
        return Err(CatalogError::ValidationError(
            "deleteList cannot be empty".to_string(),
        ));
    }

    let pipeline = state.pipeline();
    let outcome = tokio::task::spawn_blocking(move || pipeline.remove_images(&images))
        .await
        .map_err(|e| CatalogError::InternalError(format!("removal task failed: {}", e)))??;

    state.update_cache(|cache| {
        for image in &outcome.removed {
            cache.remove(image);
        }
    });

    tracing::info!(
        "Removal job {} finished with status {}, removed: {:?}",
        outcome.job.id,
        outcome.job.status,
        outcome.removed
    );

    Ok(outcome)
}

/// List every cached image with its CLIs
pub fn list_images(state: &SharedState) -> Vec<ImageListing> {
    state
        .read_cache()
        .records()
        .map(|record| ImageListing {
            name: record.name.clone(),
            clis: record
                .clis
                .iter()
                .map(|(name, entry)| CliListing {
                    name: name.clone(),
                    cli_type: entry.cli_type.clone(),
                })
                .collect(),
        })
        .collect()
}
