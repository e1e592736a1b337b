//! Error types for SMAIL.

use thiserror::Error;

/// Common error type for SMAIL.
#[derive(Error, Debug)]
pub enum SmailError {
    /// Mail store error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Identity cookie could not be produced.
    #[error("cookie error: {0}")]
    Cookie(String),

    /// Encoded identity list does not fit in a single cookie.
    #[error("identity list needs {len} bytes, at most {max} fit in a cookie")]
    CookieTooLarge {
        /// Encoded length.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },

    /// Human-verification service error.
    #[error("verification error: {0}")]
    Verification(String),
}

impl From<sqlx::Error> for SmailError {
    fn from(e: sqlx::Error) -> Self {
        SmailError::Database(e.to_string())
    }
}

/// Result type alias for SMAIL operations.
pub type Result<T> = std::result::Result<T, SmailError>;
