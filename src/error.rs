//! Error types for PARLOR.

use thiserror::Error;

/// Common error type for PARLOR.
#[derive(Error, Debug)]
pub enum ParlorError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for PARLOR operations.
pub type Result<T> = std::result::Result<T, ParlorError>;
