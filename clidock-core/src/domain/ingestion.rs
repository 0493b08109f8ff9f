//! Ingestion job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::image::MetadataCache;
use crate::domain::log::LogEntry;
use crate::error::{Error, Result};

/// Status of an ingestion or removal job
///
/// `Running` is the only non-terminal state; terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// What an image job does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Pull images and cache their CLI metadata
    Ingest,
    /// Force-remove local images
    Remove,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Ingest => write!(f, "ingestion"),
            JobKind::Remove => write!(f, "removal"),
        }
    }
}

/// Lifecycle record of one image job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ImageJob {
    /// Creates a job in the `Running` state
    pub fn start(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Running,
            started_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    /// Moves the job to a terminal status
    ///
    /// Fails if the job already finished or `status` is not terminal.
    pub fn finish(&mut self, status: JobStatus) -> Result<()> {
        if self.status.is_terminal() || !status.is_terminal() {
            return Err(Error::InvalidTransition {
                id: self.id,
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.completed_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// Finishes a running job as `Error`; a finished job keeps its status
    pub fn abort(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Error;
            self.completed_at = Some(chrono::Utc::now());
        }
    }
}

/// A failure recorded against one image, or one CLI of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionFailure {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<String>,
    pub reason: String,
}

/// Final result of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionOutcome {
    pub job: ImageJob,
    /// Pulled images that could not be found after pulling
    pub not_found: Vec<String>,
    pub failures: Vec<IngestionFailure>,
    pub log: Vec<LogEntry>,
    /// Every image that produced at least one CLI
    pub cache: MetadataCache,
}

impl IngestionOutcome {
    pub fn status(&self) -> JobStatus {
        self.job.status
    }

    pub fn is_success(&self) -> bool {
        self.job.status == JobStatus::Success
    }
}

/// Final result of an image removal run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalOutcome {
    pub job: ImageJob,
    pub removed: Vec<String>,
    pub failures: Vec<IngestionFailure>,
    pub log: Vec<LogEntry>,
}

/// A job cut short by an error it could not record and move past
///
/// The job is already finished as `Error` and the log ends with its status
/// line.
#[derive(Debug, thiserror::Error)]
#[error("job {} aborted: {error}", .job.id)]
pub struct JobAborted {
    #[source]
    pub error: Error,
    pub job: ImageJob,
    pub log: Vec<LogEntry>,
}

impl JobAborted {
    pub fn is_fatal(&self) -> bool {
        self.error.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_finishes_once() {
        let mut job = ImageJob::start(JobKind::Ingest);
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.completed_at.is_none());

        job.finish(JobStatus::Success).unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.completed_at.is_some());

        let err = job.finish(JobStatus::Error).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(job.status, JobStatus::Success);
    }

    #[test]
    fn test_abort_keeps_terminal_status() {
        let mut job = ImageJob::start(JobKind::Ingest);
        job.abort();
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.completed_at.is_some());

        let mut done = ImageJob::start(JobKind::Remove);
        done.finish(JobStatus::Success).unwrap();
        done.abort();
        assert_eq!(done.status, JobStatus::Success);
    }

    #[test]
    fn test_job_cannot_finish_as_running() {
        let mut job = ImageJob::start(JobKind::Remove);
        assert!(job.finish(JobStatus::Running).is_err());
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(JobStatus::Error.to_string(), "ERROR");
    }
}
