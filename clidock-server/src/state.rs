//! Shared Application State
//!
//! The metadata cache and the route registry built from it. Ingestion
//! publishes new image records under the cache write lock and swaps in a
//! freshly built registry, so a request sees either the old routes or the new
//! ones, never a mix.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use clidock_core::domain::image::MetadataCache;
use clidock_runner::ImageIngestionPipeline;
use clidock_schema::{CompileOptions, RouteRegistry};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    cache: RwLock<MetadataCache>,
    registry: RwLock<Arc<RouteRegistry>>,
    pipeline: Arc<ImageIngestionPipeline>,
    options: CompileOptions,
}

impl AppState {
    pub fn new(pipeline: ImageIngestionPipeline, options: CompileOptions) -> Self {
        Self {
            cache: RwLock::new(MetadataCache::new()),
            registry: RwLock::new(Arc::new(RouteRegistry::default())),
            pipeline: Arc::new(pipeline),
            options,
        }
    }

    pub fn pipeline(&self) -> Arc<ImageIngestionPipeline> {
        self.pipeline.clone()
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Current route registry
    pub fn registry(&self) -> Arc<RouteRegistry> {
        match self.registry.read() {
            Ok(registry) => registry.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn read_cache(&self) -> RwLockReadGuard<'_, MetadataCache> {
        match self.cache.read() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Applies `change` to the cache and swaps in a registry built from the
    /// result, all under the cache write lock
    pub fn update_cache<T>(&self, change: impl FnOnce(&mut MetadataCache) -> T) -> T {
        let mut cache = self.write_cache();
        let result = change(&mut *cache);

        let registry = RouteRegistry::build(&*cache);
        tracing::info!(
            "Route registry rebuilt: {} route(s), {} failed CLI(s)",
            registry.len(),
            registry.failures().len()
        );

        match self.registry.write() {
            Ok(mut current) => *current = Arc::new(registry),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(registry),
        }
        result
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, MetadataCache> {
        match self.cache.write() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
