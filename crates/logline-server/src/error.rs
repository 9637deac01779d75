//! Error types for the ingestion API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use logline_core::{FieldViolation, StoreError};
use serde::Serialize;
use thiserror::Error;

use crate::ingest::IngestError;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Public message for every 5xx response. Internal detail is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Errors that can occur while serving the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The candidate record failed validation.
    #[error("invalid log data: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The request body or query string could not be decoded.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Status chosen by the extractor (400, 413, 415, ...).
        status: StatusCode,
        /// Extractor message.
        message: String,
    },

    /// The log store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Too many WebSocket viewers.
    #[error("too many connections: {0} active, limit is {1}")]
    TooManyConnections(usize, usize),

    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(violations) => Self::Validation(violations),
            IngestError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Marker attached to 5xx responses carrying the detail that must not reach
/// the client. The error-reporting middleware logs it and adds the path.
#[derive(Debug, Clone)]
pub struct InternalFailure(pub String);

/// Body of a validation or request decoding failure.
#[derive(Debug, Serialize)]
struct InvalidBody {
    error: &'static str,
    details: Vec<FieldViolation>,
}

/// Body of a 5xx response.
#[derive(Debug, Serialize)]
pub(crate) struct InternalErrorBody {
    pub error: &'static str,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl InternalErrorBody {
    pub(crate) fn new(path: Option<String>) -> Self {
        Self {
            error: INTERNAL_ERROR_MESSAGE,
            timestamp: Utc::now(),
            path,
        }
    }
}

/// Builds a 500 response carrying `detail` for the error reporter.
pub(crate) fn internal_response(status: StatusCode, detail: String) -> Response {
    let mut response = (status, Json(InternalErrorBody::new(None))).into_response();
    response.extensions_mut().insert(InternalFailure(detail));
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(InvalidBody {
                    error: "Invalid log data",
                    details,
                }),
            )
                .into_response(),
            Self::InvalidRequest { status, message } => (
                status,
                Json(InvalidBody {
                    error: "Invalid request",
                    details: vec![FieldViolation::new("", message)],
                }),
            )
                .into_response(),
            Self::TooManyConnections(_, _) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": self.to_string() })),
            )
                .into_response(),
            Self::Storage(_) | Self::BindFailed(_, _) | Self::Internal(_) => {
                internal_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let err = ApiError::Validation(vec![FieldViolation::required("message")]);
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid log data");
        assert_eq!(json["details"][0]["field"], "message");
        assert_eq!(json["details"][0]["message"], "Required");
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_status() {
        let err = ApiError::InvalidRequest {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".to_string(),
        };
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_storage_error_hides_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/logs.json");
        let err = ApiError::Storage(StoreError::Io {
            path: "/secret/logs.json".into(),
            source: io,
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalFailure>().cloned();
        assert!(detail.unwrap().0.contains("/secret/logs.json"));

        let json = body_json(response).await;
        assert_eq!(json["error"], INTERNAL_ERROR_MESSAGE);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(!json.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_too_many_connections_error_response() {
        let response = ApiError::TooManyConnections(100, 50).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_from_ingest_error() {
        let err = ApiError::from(IngestError::Validation(vec![FieldViolation::required("level")]));
        assert!(matches!(err, ApiError::Validation(ref v) if v.len() == 1));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Validation(vec![
            FieldViolation::required("level"),
            FieldViolation::required("commit"),
        ]);
        assert_eq!(err.to_string(), "invalid log data: 2 violation(s)");

        let err = ApiError::Internal("boom".to_string());
        assert_eq!(err.to_string(), "internal error: boom");
    }
}
