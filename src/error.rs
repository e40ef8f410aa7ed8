//! Application error types.
//!
//! `AppError` covers the fallible plumbing (file I/O, network transfer,
//! backend responses). Validation and duration verdicts are NOT errors —
//! they are returned as values from the `services` layer and never thrown.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Local file system failure (blob read, metadata lookup).
    #[error("IO error: {0}")]
    Io(String),

    /// Transport-level failure (connection, timeout, DNS).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend responded, but with a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}
