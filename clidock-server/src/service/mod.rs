//! Service Module
//!
//! Business logic layer for the server.
//! Services run jobs off the async runtime and keep the cache and the route
//! registry in step.

pub mod catalog;

// Re-export for convenience
pub use catalog as catalog_service;
