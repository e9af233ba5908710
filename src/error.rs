//! Custom error types for rustbibcache.
//!
//! Resolvers never surface most of these to the caller: a failed upstream
//! call is swallowed by the fallback chain. Only input/output failures
//! reach `main`.

use thiserror::Error;

/// Main error type for rustbibcache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Status code returned by the upstream service
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Body or markup could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Body parsed but does not have the shape a source expects
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input table error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// A record reference that cannot be resolved (e.g. no record id)
    #[error("Invalid record reference: {0}")]
    InvalidRecord(String),
}

/// Result type alias using `CacheError`
pub type Result<T> = std::result::Result<T, CacheError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a shape error message
    fn ok_or_shape(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_shape(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| CacheError::Shape(msg.to_string()))
    }
}
