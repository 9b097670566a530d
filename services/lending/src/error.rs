//! Custom error types for the lending service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Custom error type for the lending service API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad input; nothing was mutated
    #[error("{0}")]
    Validation(String),

    /// Anonymous caller, or the wrong actor for the action
    #[error("You are not authorized to do that action")]
    Unauthorized,

    /// Failed credential check at login, with a caller-facing message
    #[error("{0}")]
    InvalidCredentials(&'static str),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// The current state forbids the request
    #[error("{0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(msg) => ApiError::Validation(msg),
            LifecycleError::Unauthorized => ApiError::Unauthorized,
            LifecycleError::NotFound(msg) => ApiError::NotFound(msg.to_string()),
            LifecycleError::Conflict(msg) => ApiError::Conflict(msg.to_string()),
            LifecycleError::AlreadyHandedOver => {
                ApiError::Conflict("Book is already handed over".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "You are not authorized to do that action".to_string(),
            ),
            ApiError::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_errors_map_to_api_taxonomy() {
        assert!(matches!(
            ApiError::from(LifecycleError::Unauthorized),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::NotFound("x")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::Conflict("x")),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::AlreadyHandedOver),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::Validation("x".to_string())),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApiError::InvalidCredentials("Invalid password. Please try again"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::NotFound("gone".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Conflict("busy".to_string()), StatusCode::CONFLICT),
            (
                ApiError::InternalServerError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
