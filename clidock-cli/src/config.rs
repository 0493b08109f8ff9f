//! Configuration module
//!
//! Handles CLI configuration: where the metadata cache lives and which
//! container engine to drive.

use std::path::PathBuf;

use clidock_runner::{JsonFileCacheStore, RunnerConfig};
use clidock_schema::CompileOptions;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the JSON metadata cache
    pub cache_path: PathBuf,

    /// Container engine settings
    pub runner: RunnerConfig,
}

impl Config {
    /// Store over the configured cache file
    pub fn store(&self) -> JsonFileCacheStore {
        JsonFileCacheStore::new(self.cache_path.clone())
    }

    /// Compile options for offline compilation
    pub fn compile_options(&self, data_dir: Option<String>) -> CompileOptions {
        match data_dir {
            Some(data_dir) => CompileOptions { data_dir },
            None => CompileOptions::default(),
        }
    }
}
