//! Metadata cache persistence
//!
//! The whole cache is one JSON document. Writes go to a fresh temporary file
//! next to the target and are renamed into place, so readers never see a
//! partial cache. Load-modify-write cycles hold an exclusive lock on a
//! `.lock` sibling, so concurrent ingestion runs never drop each other's
//! records.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use clidock_core::Result;
use clidock_core::domain::image::MetadataCache;
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

/// Durable home of the metadata cache
pub trait CacheStore: Send + Sync {
    /// Loads the stored cache; an absent store is an empty cache
    fn load(&self) -> Result<MetadataCache>;

    /// Publishes a slice, each record replacing its image whole
    ///
    /// Returns the cache as stored after the publish.
    fn publish(&self, slice: MetadataCache) -> Result<MetadataCache>;

    /// Removes images from the store, returning the ones that were present
    fn evict(&self, images: &[String]) -> Result<Vec<String>>;
}

/// [`CacheStore`] backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache.json".to_string());
        self.parent().join(format!("{}.lock", file_name))
    }

    /// Runs `change` on the stored cache under the store lock
    ///
    /// The cache is written back only when `change` reports a modification.
    fn modify<T>(&self, change: impl FnOnce(&mut MetadataCache) -> (T, bool)) -> Result<T> {
        fs::create_dir_all(self.parent())?;

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;

        let result = self.modify_locked(change);
        drop(lock_file);
        result
    }

    fn modify_locked<T>(
        &self,
        change: impl FnOnce(&mut MetadataCache) -> (T, bool),
    ) -> Result<T> {
        let mut cache = self.load()?;
        let (result, changed) = change(&mut cache);
        if changed {
            self.write(&cache)?;
        }
        Ok(result)
    }

    fn write(&self, cache: &MetadataCache) -> Result<()> {
        // Dropping an unpersisted temp file removes it
        let mut tmp = NamedTempFile::new_in(self.parent())?;
        serde_json::to_writer_pretty(&mut tmp, cache)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            "Wrote {} image(s) to cache file {}",
            cache.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl CacheStore for JsonFileCacheStore {
    fn load(&self) -> Result<MetadataCache> {
        if !self.path.exists() {
            return Ok(MetadataCache::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(MetadataCache::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn publish(&self, slice: MetadataCache) -> Result<MetadataCache> {
        self.modify(|cache| {
            cache.publish(slice);
            (cache.clone(), true)
        })
    }

    fn evict(&self, images: &[String]) -> Result<Vec<String>> {
        self.modify(|cache| {
            let evicted: Vec<String> = images
                .iter()
                .filter(|image| cache.remove(image).is_some())
                .cloned()
                .collect();
            let changed = !evicted.is_empty();
            (evicted, changed)
        })
    }
}
