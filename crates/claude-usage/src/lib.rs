//! # claude-usage
//!
//! Fetches Claude subscription usage from the Anthropic OAuth usage endpoint:
//! the 5-hour and 7-day utilization windows, their reset instants, and the
//! cumulative extra-usage (overage) credits.
//!
//! ## Features
//!
//! - Cross-platform credential retrieval (macOS Keychain, Linux credential file,
//!   `CLAUDE_CODE_OAUTH_TOKEN` override)
//! - Typed response structures tolerant of missing or `null` fields
//! - Secure credential handling (read, use, discard immediately)
//!
//! ## Example
//!
//! ```rust,ignore
//! use claude_usage::{fetch_usage, get_token};
//!
//! let token = get_token()?;
//! let usage = fetch_usage(&token)?;
//! println!("5h utilization: {:?}%", usage.five_hour.utilization);
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use credentials::get_token;
pub use error::{ApiError, CredentialError, Error};
pub use types::{parse_timestamp, ExtraUsage, UsageData, UsagePeriod};

/// Fetch and parse usage data with an already-resolved token (blocking).
///
/// # Errors
///
/// [`Error::Api`] for transport or status failures, [`Error::Parse`] when the
/// body is not a usage document.
#[cfg(feature = "blocking")]
pub fn fetch_usage(token: &str) -> Result<UsageData, Error> {
    let body = client::fetch_usage_raw(token)?;
    UsageData::from_json(&body).map_err(|e| Error::Parse(e.to_string()))
}
