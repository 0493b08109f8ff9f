//! Clidock Runner
//!
//! Everything that touches the container engine or the disk:
//! - Container engine access over the `podman`/`docker` command line
//! - CLI metadata extraction from images
//! - The ingestion pipeline and the image removal job
//! - Job log sinks
//! - JSON-file persistence of the metadata cache
//!
//! All calls block; async callers run them on a worker thread.

pub mod config;
pub mod container;
pub mod extractor;
pub mod pipeline;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod sink;
pub mod store;

pub use config::RunnerConfig;
pub use container::{CliContainerRunner, ContainerRunner, RunOutput};
pub use extractor::CliMetadataExtractor;
pub use pipeline::ImageIngestionPipeline;
pub use sink::{InMemoryLogBuffer, LogSink, TracingLogSink};
pub use store::{CacheStore, JsonFileCacheStore};
