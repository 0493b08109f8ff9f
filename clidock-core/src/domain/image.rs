//! Image metadata domain types
//!
//! Records produced by ingestion: which CLIs an image exposes and the raw XML
//! schema of each one, plus the cache that maps image names to records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata of a single CLI inside an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliMetadataEntry {
    /// Classification reported by the image's CLI list (e.g. `cpu`, `gpu`)
    #[serde(rename = "type")]
    pub cli_type: String,
    /// Raw XML schema text
    pub xml: String,
}

/// All CLI metadata extracted from one image
///
/// Immutable once published to a [`MetadataCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Image reference (repo:tag)
    pub name: String,
    pub clis: BTreeMap<String, CliMetadataEntry>,
}

impl ImageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clis: BTreeMap::new(),
        }
    }

    pub fn add_cli(&mut self, cli_name: impl Into<String>, entry: CliMetadataEntry) {
        self.clis.insert(cli_name.into(), entry);
    }

    pub fn cli(&self, cli_name: &str) -> Option<&CliMetadataEntry> {
        self.clis.get(cli_name)
    }

    pub fn cli_names(&self) -> impl Iterator<Item = &str> {
        self.clis.keys().map(String::as_str)
    }
}

/// Image name → extracted CLI metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataCache {
    images: BTreeMap<String, ImageRecord>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any previous record for the same image
    pub fn insert(&mut self, record: ImageRecord) -> Option<ImageRecord> {
        self.images.insert(record.name.clone(), record)
    }

    /// Publishes every record of `slice`, each replacing its image whole
    ///
    /// Images absent from the slice are left untouched. Returns the names of
    /// the published images.
    pub fn publish(&mut self, slice: MetadataCache) -> Vec<String> {
        let mut published = Vec::with_capacity(slice.images.len());
        for (name, record) in slice.images {
            self.images.insert(name.clone(), record);
            published.push(name);
        }
        published
    }

    pub fn remove(&mut self, image: &str) -> Option<ImageRecord> {
        self.images.remove(image)
    }

    pub fn get(&self, image: &str) -> Option<&ImageRecord> {
        self.images.get(image)
    }

    pub fn contains(&self, image: &str) -> bool {
        self.images.contains_key(image)
    }

    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.values()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
