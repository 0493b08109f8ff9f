//! Error types for ingestion and schema compilation.

use uuid::Uuid;

use crate::domain::ingestion::JobStatus;

/// Result type alias for clidock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while ingesting images or compiling CLI schemas.
///
/// Only [`Error::RuntimeUnavailable`] is fatal to a whole run; every other
/// variant is recorded against a single image, CLI or request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Container Engine Errors
    // =========================================================================
    /// The container engine cannot be reached.
    #[error("container runtime '{engine}' not available: {reason}")]
    RuntimeUnavailable { engine: String, reason: String },

    /// Images that could not be pulled or found after pulling.
    #[error("could not find the following images: {}", .images.join(", "))]
    ImageNotFound { images: Vec<String> },

    /// A container run failed to launch or exited non-zero.
    #[error("attempt to run {image} {} failed: {cause}", .args.join(" "))]
    Execution {
        image: String,
        args: Vec<String>,
        cause: String,
    },

    // =========================================================================
    // Schema Errors
    // =========================================================================
    /// Malformed CLI list JSON or CLI schema XML.
    #[error("schema error: {0}")]
    Schema(String),

    /// Parameter type with no type mapping.
    #[error("parameter type '{type_name}' is currently not supported")]
    UnsupportedType { type_name: String },

    /// Optional inline scalar declared without a default.
    #[error("optional parameter '{parameter}' of type {type_name} must provide a default value")]
    MissingDefault {
        parameter: String,
        type_name: String,
    },

    /// Output reference that does not resolve to a known input.
    #[error("reference '{reference}' of parameter '{parameter}' is not a valid input")]
    InvalidReference {
        parameter: String,
        reference: String,
    },

    // =========================================================================
    // Request Errors
    // =========================================================================
    /// A required request value was not supplied.
    #[error("missing required value '{name}'")]
    MissingValue { name: String },

    /// A request value is not JSON of the expected shape.
    #[error("invalid value {value:?} for parameter '{parameter}': {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },

    // =========================================================================
    // Job Errors
    // =========================================================================
    /// Job status change out of a terminal state.
    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a schema error from a message.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Creates an execution error for a container run.
    pub fn execution(image: impl Into<String>, args: &[String], cause: impl Into<String>) -> Self {
        Self::Execution {
            image: image.into(),
            args: args.to_vec(),
            cause: cause.into(),
        }
    }

    /// Whether this error aborts the whole run rather than a single unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RuntimeUnavailable { .. })
    }

    /// Whether this error comes from compiling a CLI schema.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(_)
                | Self::UnsupportedType { .. }
                | Self::MissingDefault { .. }
                | Self::InvalidReference { .. }
        )
    }

    /// Whether this error was caused by the values of a request.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::MissingValue { .. } | Self::InvalidValue { .. })
    }
}
