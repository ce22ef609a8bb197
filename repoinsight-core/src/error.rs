//! Error types for RepoInsight core.

use thiserror::Error;

/// Error type for RepoInsight core operations.
#[derive(Debug, Error)]
pub enum InsightError {
    /// The HTTP transport failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The upstream API answered with a non-success status.
    #[error("api error ({status}) for {url}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The language histogram has no bytes, so no metrics can be estimated.
    #[error("language histogram is empty")]
    EmptyHistogram,
    /// A repository reference could not be parsed.
    #[error("invalid repository reference: {0}")]
    InvalidRepository(String),
    /// A catch-all error with a message.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for InsightError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Convenience result type for RepoInsight core.
pub type Result<T> = std::result::Result<T, InsightError>;
