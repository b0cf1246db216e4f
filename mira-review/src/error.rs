//! Error types for mira-review

use crate::importer::ImportError;
use crate::sync::SyncError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload over the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// External spreadsheet failure (502, or 503 when sync is not configured)
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// mira-common error
    #[error("Common error: {0}")]
    Common(mira_common::Error),
}

impl From<mira_common::Error> for ApiError {
    fn from(err: mira_common::Error) -> Self {
        match err {
            mira_common::Error::UnknownSession(_) => ApiError::NotFound(err.to_string()),
            mira_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other if other.is_validation() => ApiError::BadRequest(other.to_string()),
            other => ApiError::Common(other),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ImportError::Storage(inner) => ApiError::from(inner),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Malformed or mistyped JSON bodies are validation errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            ApiError::Sync(SyncError::Disabled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SYNC_DISABLED",
                SyncError::Disabled.to_string(),
            ),
            ApiError::Sync(ref err @ SyncError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SYNC_STORAGE_ERROR",
                err.to_string(),
            ),
            ApiError::Sync(ref err) => (StatusCode::BAD_GATEWAY, "SYNC_ERROR", err.to_string()),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_client_errors() {
        let err: ApiError = mira_common::Error::InvalidInput("bad".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = mira_common::Error::UnknownSession("S1".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = mira_common::Error::unknown_value("verdict", "maybe").into();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("maybe")));

        let err: ApiError = mira_common::Error::Internal("boom".to_string()).into();
        assert!(matches!(err, ApiError::Common(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::Sync(SyncError::Disabled), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Sync(SyncError::Unreachable("down".into())), StatusCode::BAD_GATEWAY),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
