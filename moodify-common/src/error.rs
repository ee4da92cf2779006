//! Common error types for Moodify

use thiserror::Error;

/// Common result type for Moodify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the history store, accounts and analytics
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range caller input
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Upstream dependency failure
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Persistence-layer failure that is not a raw database error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for building a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(format!("JSON serialization failed: {}", err))
    }
}
