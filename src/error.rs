//! Error types for the mastery-zone controller

use thiserror::Error;

/// Errors that can occur while building or driving a controller
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse controller state: {0}")]
    ParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Reject a value that is not a finite fraction in `[0.0, 1.0]`.
pub(crate) fn check_unit_interval(value: f64, what: &str) -> Result<(), ZoneError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ZoneError::InvalidInput(format!(
            "{what} must be within [0.0, 1.0], got {value}"
        )))
    }
}
