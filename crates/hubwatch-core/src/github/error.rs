//! GitHub API error types.

use thiserror::Error;

/// Errors returned by [`CodeHost`](super::CodeHost) implementations.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The requested user, repository, branch or file does not exist
    /// (or is not visible with the configured token).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The token was rejected.
    #[error("GitHub rejected the access token (HTTP 401)")]
    Unauthorized,

    /// The API rate limit is exhausted. No backoff is attempted.
    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    /// Any other non-success response.
    #[error("GitHub API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The path refers to something other than a regular file.
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// The file is too large for the contents API to return inline.
    #[error("File too large to fetch inline: {0}")]
    TooLarge(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured API base URL is unusable.
    #[error("Invalid GitHub API URL: {0}")]
    InvalidApiUrl(String),

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GitHubError::Decode(e.to_string())
        } else {
            GitHubError::Http(e.to_string())
        }
    }
}

/// Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, GitHubError>;
