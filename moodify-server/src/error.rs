//! Error types for moodify-server
//!
//! Every failing handler answers with a flat `{"error": "<message>"}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use moodify_common::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

use crate::catalog::CatalogError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. email already registered
    #[error("{0}")]
    Conflict(String),

    /// Upstream dependency failed (500)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<moodify_common::Error> for ApiError {
    fn from(err: moodify_common::Error) -> Self {
        use moodify_common::Error;
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Authentication(msg) => ApiError::Unauthorized(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => ApiError::BadRequest(msg),
            // Upstream credential failures are the server's problem, not the caller's
            CatalogError::Authentication(msg) => {
                ApiError::ServiceUnavailable(format!("Music catalog authentication failed: {}", msg))
            }
            CatalogError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
