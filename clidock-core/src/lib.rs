//! Clidock Core
//!
//! Core types and abstractions shared by every clidock crate.
//!
//! This crate contains:
//! - Domain types: CLI schemas, parameters, image records, the metadata cache,
//!   ingestion jobs and compiled task specifications
//! - DTOs: request/response bodies exchanged with the HTTP surface
//! - The error taxonomy used across ingestion and compilation

pub mod domain;
pub mod dto;
pub mod error;

pub use error::{Error, Result};
