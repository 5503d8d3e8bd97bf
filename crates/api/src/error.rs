use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use spyglass_core::error::SpyglassError;

/// Errors surfaced to HTTP callers. Bodies are plain text; internal causes
/// are logged and never echoed back.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    NotFound,
    Conflict(String),
    Internal(String),
}

impl From<SpyglassError> for ApiError {
    fn from(err: SpyglassError) -> Self {
        match err {
            SpyglassError::InvalidArgument(msg) | SpyglassError::Parse(msg) => {
                Self::BadRequest(msg)
            }
            SpyglassError::Conflict(msg) => Self::Conflict(msg),
            SpyglassError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            ApiError::Conflict(msg) => {
                tracing::debug!(reason = %msg, "rejected duplicate trace");
                (StatusCode::CONFLICT, "Conflict".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, body).into_response()
    }
}
