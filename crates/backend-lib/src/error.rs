// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid or expired bearer token")]
    InvalidToken,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("No pending provider link in this session")]
    NoPendingLink,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) | AppError::InvalidToken | AppError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UsernameTaken | AppError::NoPendingLink => StatusCode::CONFLICT,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "AUTH_001",
            AppError::InvalidToken => "AUTH_002",
            AppError::InvalidSession => "AUTH_003",
            AppError::AuthRateLimited => "AUTH_004",
            AppError::Internal(_) => "INT_001",
            AppError::Json(_) => "JSON_001",
            AppError::NotFound(_) => "NF_001",
            AppError::UsernameTaken => "LINK_001",
            AppError::NoPendingLink => "LINK_002",
            AppError::InvalidInput(_) => "VAL_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Auth(_) | AppError::InvalidToken => "Authentication failed".to_string(),
            AppError::InvalidSession => "Session is invalid or expired".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::UsernameTaken => "Username already taken".to_string(),
            AppError::NoPendingLink => {
                "No provider sign-in is waiting to be linked".to_string()
            },
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        // Create a JSON response with error details
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
