//! Production collaborators backed by `claude-usage` and the system clock.

use chrono::{DateTime, Utc};
use claude_usage::CredentialError;

use super::{Clock, CredentialProvider, RefreshError, UsageSource};
use crate::snapshot::UsageSnapshot;

/// Reads the Claude OAuth token from the environment or platform storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeCredentials;

impl CredentialProvider for ClaudeCredentials {
    fn bearer_token(&self) -> Result<String, CredentialError> {
        claude_usage::get_token()
    }
}

/// Calls the live usage endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeUsageSource;

impl UsageSource for ClaudeUsageSource {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, RefreshError> {
        claude_usage::fetch_usage(token)
            .map(|data| UsageSnapshot::from(&data))
            .map_err(|e| RefreshError::FetchFailed(e.to_string()))
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
