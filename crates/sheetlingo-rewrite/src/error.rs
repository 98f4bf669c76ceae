//! Rewrite error types

use thiserror::Error;

/// Result type for rewrite operations
pub type RewriteResult<T> = std::result::Result<T, RewriteError>;

/// Failure of a rewrite capability
///
/// Every variant is recoverable: callers fall back to a local rewrite.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status with the response body
    #[error("HTTP {0}: {1}")]
    Http(u16, String),

    /// Response body was not what the service promises
    #[error("Parse error: {0}")]
    Parse(String),

    /// Service answered with blank text
    #[error("Empty response from rewrite service")]
    EmptyResponse,

    /// No endpoint configured
    #[error("No rewrite endpoints configured")]
    NoEndpoints,

    /// Async job ended in failure
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
