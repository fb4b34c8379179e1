//! HTTP client for the Anthropic usage API.
//!
//! Sends the bearer token and beta header, maps status codes onto
//! [`ApiError`], and hands back the raw body for parsing.

use std::time::Duration;

use crate::error::ApiError;

/// Anthropic OAuth usage API endpoint.
pub const USAGE_API_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Required beta header value for OAuth endpoints.
pub const BETA_HEADER: &str = "oauth-2025-04-20";

/// Upper bound on a single request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch raw usage data from the Anthropic API (blocking).
///
/// Makes one synchronous request and returns the raw JSON body. Callers on
/// an async runtime should run this on the blocking pool.
///
/// # Arguments
///
/// * `token` - OAuth access token for authentication
///
/// # Errors
///
/// Returns [`ApiError`] if:
/// - Network request fails
/// - Server returns 401 (unauthorized)
/// - Server returns 429 (rate limited)
/// - Server returns 5xx (server error)
/// - Server returns unexpected status code
///
/// # Security
///
/// The token is used only for this request and is not stored.
#[cfg(feature = "blocking")]
pub fn fetch_usage_raw(token: &str) -> Result<String, ApiError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::Network(e.to_string()))?;

    let response = client
        .get(USAGE_API_URL)
        .header("Authorization", format!("Bearer {}", token))
        .header("anthropic-beta", BETA_HEADER)
        .send()
        .map_err(|e| ApiError::Network(e.to_string()))?;

    map_response(response)
}

/// Map HTTP response to result, handling error status codes.
#[cfg(feature = "blocking")]
fn map_response(response: reqwest::blocking::Response) -> Result<String, ApiError> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    match status_error(status, retry_after) {
        None => response
            .text()
            .map_err(|e| ApiError::Network(e.to_string())),
        Some(err) => Err(err),
    }
}

/// Classify a status code. `None` means the body should be read.
#[cfg_attr(not(feature = "blocking"), allow(dead_code))]
fn status_error(status: u16, retry_after: Option<String>) -> Option<ApiError> {
    match status {
        200 => None,
        401 => Some(ApiError::Unauthorized),
        429 => Some(ApiError::RateLimited { retry_after }),
        500..=599 => Some(ApiError::Server(status)),
        _ => Some(ApiError::Unexpected(status)),
    }
}
