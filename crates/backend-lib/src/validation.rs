// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Request field validation.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::AppError;

// Common validation constants
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_PROVIDER_ID_LENGTH: usize = 128;

// Regex patterns for validation
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap());
static PROVIDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{1,31}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid provider name: {0}")]
    InvalidProvider(String),

    #[error("Invalid provider profile id: {0}")]
    InvalidProviderId(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(username)
}

/// Validate a password field before it reaches the hasher. Strength rules
/// live in [`crate::auth::validate_password_strength`]; this only rejects
/// payloads no password is ever allowed to be.
pub fn validate_password_field(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword("must not be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(password)
}

/// Validate an OAuth provider name
pub fn validate_provider(provider: &str) -> ValidationResult<&str> {
    if !PROVIDER_REGEX.is_match(provider) {
        return Err(ValidationError::InvalidProvider(
            "must be a short lowercase identifier".to_string(),
        ));
    }
    Ok(provider)
}

/// Validate a provider-assigned profile id
pub fn validate_provider_id(provider_id: &str) -> ValidationResult<&str> {
    if provider_id.is_empty() {
        return Err(ValidationError::InvalidProviderId("must not be empty".to_string()));
    }
    if provider_id.len() > MAX_PROVIDER_ID_LENGTH {
        return Err(ValidationError::InvalidProviderId(format!(
            "must be at most {MAX_PROVIDER_ID_LENGTH} bytes"
        )));
    }
    if provider_id.chars().any(char::is_control) {
        return Err(ValidationError::InvalidProviderId(
            "must not contain control characters".to_string(),
        ));
    }
    Ok(provider_id)
}
