//! CLI metadata extraction
//!
//! Asks an image which CLIs it carries, then asks each CLI for its XML schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use clidock_core::domain::image::{CliMetadataEntry, ImageRecord};
use clidock_core::{Error, Result};
use clidock_schema::parse_cli_schema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RunnerConfig;
use crate::container::ContainerRunner;

/// One entry of an image's CLI list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliListEntry {
    #[serde(rename = "type")]
    pub cli_type: String,
}

/// CLI name → list entry, as printed by the image's list flag
pub type CliList = BTreeMap<String, CliListEntry>;

/// Result of extracting every CLI of one image
#[derive(Debug)]
pub struct Extraction {
    /// Every CLI that extracted cleanly
    pub record: ImageRecord,
    /// CLIs that failed, with the reason
    pub failures: Vec<(String, Error)>,
}

impl Extraction {
    /// Whether no CLI could be extracted
    pub fn is_empty(&self) -> bool {
        self.record.clis.is_empty()
    }
}

/// Retrieves CLI lists and schemas from images
pub struct CliMetadataExtractor {
    runner: Arc<dyn ContainerRunner>,
    list_flag: String,
    xml_flag: String,
}

impl CliMetadataExtractor {
    pub fn new(runner: Arc<dyn ContainerRunner>, config: &RunnerConfig) -> Self {
        Self {
            runner,
            list_flag: config.list_flag.clone(),
            xml_flag: config.xml_flag.clone(),
        }
    }

    /// Runs the image with the list flag and parses its CLI list
    ///
    /// # Errors
    /// - `Execution` if the container run fails
    /// - `Schema` if stdout is not a JSON CLI list
    pub fn list_clis(&self, image: &str) -> Result<CliList> {
        let output = self.runner.run(image, &[self.list_flag.clone()])?;

        serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::schema(format!(
                "CLI list of image {} is not valid JSON: {}",
                image, e
            ))
        })
    }

    /// Runs `<image> <cli> --xml` and returns the schema text
    ///
    /// The text is checked with the schema parser before it is returned.
    ///
    /// # Errors
    /// `Schema` if the run fails, prints nothing, or prints malformed XML
    pub fn get_xml(&self, image: &str, cli: &str) -> Result<String> {
        let args = [cli.to_string(), self.xml_flag.clone()];
        let output = self.runner.run(image, &args).map_err(|e| match e {
            Error::Execution { cause, .. } => Error::schema(format!(
                "could not get XML schema of CLI {} in image {}: {}",
                cli, image, cause
            )),
            other => other,
        })?;

        let xml = output.stdout_text();
        if xml.trim().is_empty() {
            return Err(Error::schema(format!(
                "CLI {} in image {} printed an empty XML schema",
                cli, image
            )));
        }

        parse_cli_schema(&xml)?;
        Ok(xml)
    }

    /// Extracts every CLI of an image
    ///
    /// A CLI that fails is recorded in [`Extraction::failures`] and does not
    /// stop the remaining CLIs.
    ///
    /// # Errors
    /// Fails only if the CLI list itself cannot be retrieved, or if the
    /// container engine becomes unavailable.
    pub fn extract_all(&self, image: &str) -> Result<Extraction> {
        let list = self.list_clis(image)?;
        debug!("Image {} lists {} CLI(s)", image, list.len());

        let mut extraction = Extraction {
            record: ImageRecord::new(image),
            failures: Vec::new(),
        };

        for (cli, entry) in list {
            match self.get_xml(image, &cli) {
                Ok(xml) => extraction.record.add_cli(
                    cli,
                    CliMetadataEntry {
                        cli_type: entry.cli_type,
                        xml,
                    },
                ),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => extraction.failures.push((cli, e)),
            }
        }

        Ok(extraction)
    }
}
