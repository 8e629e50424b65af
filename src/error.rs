// src/error.rs

//! Unified error handling for the deal aggregator.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pagination for a category could not complete; the run is aborted.
    #[error("Category '{category}' failed on page {page} after {attempts} attempts: {reason}")]
    CategoryFailed {
        category: String,
        page: u32,
        attempts: u32,
        reason: FetchError,
    },

    /// The final atomic write failed; the previous snapshot is untouched.
    #[error("Commit to {path:?} failed: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The previously committed snapshot could not be decoded.
    #[error("Snapshot at {path:?} is unreadable: {message}")]
    CorruptSnapshot { path: PathBuf, message: String },

    /// Refused to replace a non-empty snapshot with an empty one.
    #[error("Refusing to commit an empty snapshot over {previous_count} existing deals")]
    EmptySnapshot { previous_count: usize },

    /// Deal count dropped beyond the configured threshold.
    #[error(
        "Deals fell {previous_count} → {current_count} ({drop_percent:.1}% > {threshold_percent}%)"
    )]
    SnapshotDrop {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
        threshold_percent: u8,
    },

    /// Fast-path mirror write failed
    #[error("Mirror error: {0}")]
    Mirror(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a mirror error.
    pub fn mirror(message: impl fmt::Display) -> Self {
        Self::Mirror(message.to_string())
    }

    /// Create a corrupt snapshot error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::CorruptSnapshot {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Transient failure of a single page request.
///
/// Every variant is retried the same way; the distinction only feeds logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not finish within its timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not a decodable page
    #[error("malformed page body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_failure_message_names_page_and_reason() {
        let err = AppError::CategoryFailed {
            category: "dog_food".into(),
            page: 3,
            attempts: 4,
            reason: FetchError::Status(503),
        };
        let msg = err.to_string();
        assert!(msg.contains("dog_food"));
        assert!(msg.contains("page 3"));
        assert!(msg.contains("503"));
    }
}
