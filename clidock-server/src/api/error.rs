//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clidock_core::dto::ingestion::JobReport;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    ServiceUnavailable(String),
    /// Engine lost mid-job; the body carries the job report
    JobAborted {
        message: String,
        report: Box<JobReport>,
    },
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            ApiError::JobAborted { message, report } => {
                tracing::error!("Job {} aborted: {}", report.job.id, message);
                return (StatusCode::SERVICE_UNAVAILABLE, Json(aborted_body(message, *report)))
                    .into_response();
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<clidock_core::Error> for ApiError {
    fn from(err: clidock_core::Error) -> Self {
        match err {
            e if e.is_fatal() => ApiError::ServiceUnavailable(e.to_string()),
            e @ clidock_core::Error::InvalidReference { .. } => ApiError::BadRequest(e.to_string()),
            e if e.is_request_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::InternalError(e.to_string()),
        }
    }
}

/// The job report with the abort reason under `error`
fn aborted_body(message: String, report: JobReport) -> serde_json::Value {
    let mut body = serde_json::to_value(report).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(fields) = body.as_object_mut() {
        fields.insert("error".to_string(), serde_json::Value::String(message));
    }
    body
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use clidock_core::Error;

    #[test]
    fn test_request_errors_are_bad_requests() {
        let missing: ApiError = Error::MissingValue {
            name: "input_fileId".to_string(),
        }
        .into();
        assert!(matches!(missing, ApiError::BadRequest(ref msg) if msg.contains("input_fileId")));

        let reference: ApiError = Error::InvalidReference {
            parameter: "output".to_string(),
            reference: "input".to_string(),
        }
        .into();
        assert!(matches!(reference, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_error_status_codes() {
        let unavailable: ApiError = Error::RuntimeUnavailable {
            engine: "podman".to_string(),
            reason: "not installed".to_string(),
        }
        .into();
        assert_eq!(
            unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let schema: ApiError = Error::schema("bad xml").into();
        assert_eq!(
            schema.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
