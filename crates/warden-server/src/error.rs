//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Token missing, unknown or expired. Deliberately carries no detail.
    #[error("Unauthorized")]
    Unauthorized,

    /// PIN input is not four digits.
    #[error("PIN must be exactly 4 digits")]
    InvalidPinFormat,

    /// PIN did not match.
    #[error("Invalid PIN")]
    InvalidCredential,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<warden_session::Error> for ServerError {
    fn from(e: warden_session::Error) -> Self {
        match e {
            warden_session::Error::InvalidFormat => ServerError::InvalidPinFormat,
            warden_session::Error::InvalidCredential => ServerError::InvalidCredential,
            warden_session::Error::Unauthorized => ServerError::Unauthorized,
            warden_session::Error::RandomSource(msg) => {
                ServerError::Internal(format!("random source failure: {}", msg))
            }
            warden_session::Error::Config(msg) => ServerError::Config(msg),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::InvalidPinFormat => (StatusCode::BAD_REQUEST, "invalid_format"),
            ServerError::InvalidCredential => (StatusCode::UNAUTHORIZED, "invalid_credential"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Server-side details stay in the log
        let message = if status.is_server_error() {
            tracing::error!(status = %status, code, error = %self, "Server error");
            "Internal server error".to_string()
        } else {
            tracing::debug!(status = %status, code, error = %self, "Client error");
            self.to_string()
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
