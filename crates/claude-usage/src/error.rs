//! Error types for the claude-usage crate.

use thiserror::Error;

/// Errors that can occur when retrieving credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Claude Code credentials not found in the platform's secure storage.
    #[error("Claude Code credentials not found. Run `claude` to login.")]
    NotFound,

    /// Credentials have expired and need to be refreshed.
    #[error("Credentials expired. Run `claude` to re-login.")]
    Expired,

    /// Failed to parse the credential payload.
    #[error("Failed to parse credentials: {0}")]
    Parse(String),

    /// Required field is missing from credentials.
    #[error("Missing field in credentials: {0}")]
    MissingField(&'static str),

    /// Permission denied when accessing credentials.
    #[error("Permission denied accessing credentials: {0}")]
    Permission(String),

    /// I/O error when reading credentials.
    #[error("I/O error reading credentials: {0}")]
    Io(String),

    /// HOME directory not set (Linux/Unix).
    #[error("HOME environment variable not set")]
    NoHomeDir,
}

/// Errors returned by the usage endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The token was rejected.
    #[error("Unauthorized: token rejected by the usage API")]
    Unauthorized,

    /// Too many requests. `retry_after` is the raw header value, if any.
    #[error("Rate limited (retry after: {})", retry_after.as_deref().unwrap_or("unknown"))]
    RateLimited {
        /// Value of the `retry-after` response header.
        retry_after: Option<String>,
    },

    /// The server answered with a 5xx status.
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// Any other non-200 status.
    #[error("Unexpected HTTP status {0}")]
    Unexpected(u16),
}

/// Error returned by [`fetch_usage`](crate::fetch_usage).
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request failed or returned a non-200 status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response body did not match the expected shape.
    #[error("Failed to parse usage response: {0}")]
    Parse(String),
}
