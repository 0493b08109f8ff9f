//! Ingestion DTOs

use serde::{Deserialize, Serialize};

use crate::domain::image::MetadataCache;
use crate::domain::ingestion::{
    ImageJob, IngestionOutcome, JobAborted, JobStatus, RemovalOutcome,
};

/// Request to ingest images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    /// Images to pull before use
    #[serde(default)]
    pub pull_list: Vec<String>,
    /// Images assumed to be present locally
    #[serde(default)]
    pub load_list: Vec<String>,
}

impl IngestionRequest {
    pub fn is_empty(&self) -> bool {
        self.pull_list.is_empty() && self.load_list.is_empty()
    }
}

/// Request to remove local images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalRequest {
    #[serde(default)]
    pub delete_list: Vec<String>,
}

/// Summary of a finished image job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job: ImageJob,
    pub status: JobStatus,
    /// Log lines in the order they were written
    pub log: Vec<String>,
    /// Metadata produced by an ingestion run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<MetadataCache>,
}

impl From<IngestionOutcome> for JobReport {
    fn from(outcome: IngestionOutcome) -> Self {
        Self {
            status: outcome.job.status,
            job: outcome.job,
            log: outcome.log.into_iter().map(|entry| entry.message).collect(),
            cache: Some(outcome.cache),
        }
    }
}

impl From<RemovalOutcome> for JobReport {
    fn from(outcome: RemovalOutcome) -> Self {
        Self {
            status: outcome.job.status,
            job: outcome.job,
            log: outcome.log.into_iter().map(|entry| entry.message).collect(),
            cache: None,
        }
    }
}

impl From<JobAborted> for JobReport {
    fn from(aborted: JobAborted) -> Self {
        Self {
            status: aborted.job.status,
            job: aborted.job,
            log: aborted.log.into_iter().map(|entry| entry.message).collect(),
            cache: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case_lists() {
        let req: IngestionRequest =
            serde_json::from_str(r#"{"pullList": ["toolimg:1"]}"#).unwrap();
        assert_eq!(req.pull_list, vec!["toolimg:1".to_string()]);
        assert!(req.load_list.is_empty());
        assert!(!req.is_empty());

        let removal: RemovalRequest =
            serde_json::from_str(r#"{"deleteList": ["old:1"]}"#).unwrap();
        assert_eq!(removal.delete_list, vec!["old:1".to_string()]);
    }
}
