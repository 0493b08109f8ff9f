//! Data Transfer Objects
//!
//! Request and response bodies exchanged between the HTTP surface and its
//! callers. DTOs are lightweight views over the domain types.

pub mod cli;
pub mod ingestion;
