//! Core domain types
//!
//! This module contains the domain structures used across clidock services.
//! Ingestion (runner) produces image records and the metadata cache; the
//! schema crate turns cached XML into typed parameters and compiled tasks.

pub mod image;
pub mod ingestion;
pub mod log;
pub mod parameter;
pub mod schema;
pub mod task;
