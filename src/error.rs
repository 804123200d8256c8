//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application-level error types
///
/// Every handler returns `Result<_, AppError>`; each variant maps to exactly
/// one HTTP status code via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request input failed validation (malformed UUID, bad date, bad field value)
    #[error("{0}")]
    Validation(String),

    /// Subscription with the given ID does not exist (or was soft-deleted)
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(Uuid),

    /// Underlying persistence failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::SubscriptionNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        // Every handled error is logged before the response goes out
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error_message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %error_message, "Request rejected");
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
