//! Image ingestion pipeline
//!
//! Pulls images, extracts the CLI metadata of pulled and already-local
//! images, and aggregates failures per image and per CLI:
//! - A failing image or CLI is recorded and processing moves on
//! - Only an unreachable container engine aborts the whole run
//! - The resulting cache holds every image that produced at least one CLI
//!
//! Also removes images (the deletion job), with the same aggregation.

use std::collections::BTreeSet;
use std::sync::Arc;

use clidock_core::domain::image::MetadataCache;
use clidock_core::domain::ingestion::{
    ImageJob, IngestionFailure, IngestionOutcome, JobAborted, JobKind, JobStatus, RemovalOutcome,
};
use clidock_core::dto::ingestion::IngestionRequest;
use clidock_core::{Error, Result};
use tracing::{debug, error, info};

use crate::config::RunnerConfig;
use crate::container::ContainerRunner;
use crate::extractor::CliMetadataExtractor;
use crate::sink::{JobLog, LogSink};

/// Runs ingestion and removal jobs against one container engine
///
/// Processing is sequential and blocking; run it on a worker thread when
/// called from async code.
pub struct ImageIngestionPipeline {
    runner: Arc<dyn ContainerRunner>,
    extractor: CliMetadataExtractor,
    sink: Arc<dyn LogSink>,
}

impl ImageIngestionPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    /// * `runner` - Container engine access
    /// * `config` - Probe flags
    /// * `sink` - Receives every job log entry as it is written
    pub fn new(
        runner: Arc<dyn ContainerRunner>,
        config: &RunnerConfig,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            extractor: CliMetadataExtractor::new(runner.clone(), config),
            runner,
            sink,
        }
    }

    /// Runs one ingestion job
    ///
    /// # Errors
    /// Returns [`JobAborted`] if the container engine cannot be reached. The
    /// aborted job is finished as `Error` and carries the log written so
    /// far. Every other failure is recorded in the outcome.
    pub fn ingest(
        &self,
        request: &IngestionRequest,
    ) -> std::result::Result<IngestionOutcome, JobAborted> {
        let job = ImageJob::start(JobKind::Ingest);
        let mut log = JobLog::new(self.sink.as_ref());

        info!(job_id = %job.id, "Starting ingestion job");
        log.info(format!(
            "Started ingestion job {}: {} image(s) to pull, {} image(s) to load",
            job.id,
            request.pull_list.len(),
            request.load_list.len()
        ));

        match self.ingest_images(request, &mut log) {
            Ok(ingested) => self.finish_ingestion(job, log, ingested),
            Err(e) => Err(abort(job, log, e)),
        }
    }

    fn ingest_images(&self, request: &IngestionRequest, log: &mut JobLog<'_>) -> Result<Ingested> {
        if let Err(e) = self.runner.check_available() {
            log.error(format!("Container engine unavailable: {}", e));
            return Err(e);
        }

        let not_found = self.pull_all(&request.pull_list, log)?;

        let mut ingested = Ingested {
            not_found,
            ..Ingested::default()
        };

        let pulled = request
            .pull_list
            .iter()
            .filter(|image| !ingested.not_found.contains(*image));
        let mut seen = BTreeSet::new();
        for image in pulled.chain(request.load_list.iter()) {
            if !seen.insert(image.as_str()) {
                log.warning(format!("Image {} listed more than once", image));
                continue;
            }
            self.load_image(image, &mut ingested.cache, &mut ingested.failures, log)?;
        }

        Ok(ingested)
    }

    fn finish_ingestion(
        &self,
        mut job: ImageJob,
        mut log: JobLog<'_>,
        ingested: Ingested,
    ) -> std::result::Result<IngestionOutcome, JobAborted> {
        let status = if ingested.not_found.is_empty() && ingested.failures.is_empty() {
            JobStatus::Success
        } else {
            JobStatus::Error
        };
        if let Err(e) = job.finish(status) {
            return Err(abort(job, log, e));
        }

        log.info(format!(
            "Finished ingestion job {} with status {}: {} image(s) cached",
            job.id,
            status,
            ingested.cache.len()
        ));
        info!(job_id = %job.id, status = %status, "Ingestion job finished");

        Ok(IngestionOutcome {
            job,
            not_found: ingested.not_found,
            failures: ingested.failures,
            log: log.into_entries(),
            cache: ingested.cache,
        })
    }

    /// Pulls every image, returning the ones that could not be found
    fn pull_all(&self, images: &[String], log: &mut JobLog<'_>) -> Result<Vec<String>> {
        let mut not_found = Vec::new();

        for image in images {
            debug!("Pulling image {}", image);
            let pulled = self
                .runner
                .pull(image)
                .and_then(|_| self.runner.image_exists(image));

            match pulled {
                Ok(true) => log.info(format!("Image {} was pulled", image)),
                Ok(false) => not_found.push(image.clone()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!("Pull of {} failed: {}", image, e);
                    not_found.push(image.clone());
                }
            }
        }

        if !not_found.is_empty() {
            log.error(
                Error::ImageNotFound {
                    images: not_found.clone(),
                }
                .to_string(),
            );
        }

        Ok(not_found)
    }

    /// Extracts one image into the cache, recording its failures
    fn load_image(
        &self,
        image: &str,
        cache: &mut MetadataCache,
        failures: &mut Vec<IngestionFailure>,
        log: &mut JobLog<'_>,
    ) -> Result<()> {
        let extraction = match self.extractor.extract_all(image) {
            Ok(extraction) => extraction,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log.error(format!("Error loading image {}: {}", image, e));
                failures.push(IngestionFailure {
                    image: image.to_string(),
                    cli: None,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        for (cli, e) in &extraction.failures {
            log.error(format!("Error loading CLI {} of image {}: {}", cli, image, e));
            failures.push(IngestionFailure {
                image: image.to_string(),
                cli: Some(cli.clone()),
                reason: e.to_string(),
            });
        }

        if extraction.is_empty() {
            let reason = if extraction.failures.is_empty() {
                "image lists no CLIs".to_string()
            } else {
                "no CLI could be loaded".to_string()
            };
            log.error(format!("Error loading image {}: {}", image, reason));
            failures.push(IngestionFailure {
                image: image.to_string(),
                cli: None,
                reason,
            });
            return Ok(());
        }

        for cli in extraction.record.cli_names() {
            log.info(format!("Loaded CLI {} of image {}", cli, image));
        }
        log.info(format!("Got metadata of image {}", image));
        cache.insert(extraction.record);
        Ok(())
    }

    /// Force-removes local images
    ///
    /// # Errors
    /// Returns [`JobAborted`] if the container engine cannot be reached.
    /// Images that fail to be removed are recorded in the outcome.
    pub fn remove_images(
        &self,
        images: &[String],
    ) -> std::result::Result<RemovalOutcome, JobAborted> {
        let mut job = ImageJob::start(JobKind::Remove);
        let mut log = JobLog::new(self.sink.as_ref());

        info!(job_id = %job.id, "Starting removal job");
        log.info(format!(
            "Started removal job {}: {} image(s)",
            job.id,
            images.len()
        ));

        let (removed, failures) = match self.remove_all(images, &mut log) {
            Ok(result) => result,
            Err(e) => return Err(abort(job, log, e)),
        };

        let status = if failures.is_empty() {
            JobStatus::Success
        } else {
            JobStatus::Error
        };
        if let Err(e) = job.finish(status) {
            return Err(abort(job, log, e));
        }

        log.info(format!(
            "Finished removal job {} with status {}",
            job.id, status
        ));
        info!(job_id = %job.id, status = %status, "Removal job finished");

        Ok(RemovalOutcome {
            job,
            removed,
            failures,
            log: log.into_entries(),
        })
    }

    fn remove_all(
        &self,
        images: &[String],
        log: &mut JobLog<'_>,
    ) -> Result<(Vec<String>, Vec<IngestionFailure>)> {
        if let Err(e) = self.runner.check_available() {
            log.error(format!("Container engine unavailable: {}", e));
            return Err(e);
        }

        let mut removed = Vec::new();
        let mut failures = Vec::new();

        for image in images {
            match self.runner.remove_image(image) {
                Ok(()) => {
                    log.info(format!("Removed image {}", image));
                    removed.push(image.clone());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log.error(format!("Failed to remove image {}: {}", image, e));
                    failures.push(IngestionFailure {
                        image: image.clone(),
                        cli: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok((removed, failures))
    }
}

/// What an ingestion run produced before its job is finished
#[derive(Default)]
struct Ingested {
    not_found: Vec<String>,
    failures: Vec<IngestionFailure>,
    cache: MetadataCache,
}

/// Finishes a job cut short by `error` as `Error`
fn abort(mut job: ImageJob, mut log: JobLog<'_>, error: Error) -> JobAborted {
    log.error(format!("Aborted job {}: {}", job.id, error));
    job.abort();
    log.info(format!(
        "Finished {} job {} with status {}",
        job.kind, job.id, job.status
    ));
    error!(job_id = %job.id, status = %job.status, "Job aborted: {}", error);

    JobAborted {
        error,
        job,
        log: log.into_entries(),
    }
}
