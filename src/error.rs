// Error taxonomy and HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Failure modes of the session operations. Validation, NotFound and
/// Invalidated are client errors; Store covers an unreachable or failing
/// key-value store.
#[derive(Debug)]
pub enum SessionError {
    /// A required input field was missing or empty.
    Validation(String),
    /// No record exists for the token.
    NotFound,
    /// The record exists but has been soft-revoked.
    Invalidated,
    /// The underlying store failed.
    Store(StoreError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Validation(detail) => write!(f, "validation error: {}", detail),
            SessionError::NotFound => write!(f, "session not found"),
            SessionError::Invalidated => write!(f, "session has been invalidated"),
            SessionError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match self {
            SessionError::Validation(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": detail }))).into_response()
            }
            SessionError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "valid": false }))).into_response()
            }
            SessionError::Invalidated => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "valid": false }))).into_response()
            }
            SessionError::Store(err) => {
                error!("store failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "store unavailable" })),
                )
                    .into_response()
            }
        }
    }
}
