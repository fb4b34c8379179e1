//! Type definitions for the Anthropic OAuth usage API response.
//!
//! Only the fields the gauges consume are modelled; unknown fields are
//! ignored so new server-side additions never break parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Usage data returned by [`fetch_usage()`](crate::fetch_usage).
///
/// `five_hour` is required: a body without it is treated as a failed fetch.
/// Everything else is optional and defaults to "unknown".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageData {
    /// 5-hour rolling window usage.
    pub five_hour: UsagePeriod,

    /// 7-day rolling window usage.
    #[serde(default)]
    pub seven_day: Option<UsagePeriod>,

    /// Extra usage (overage) billing information.
    #[serde(default)]
    pub extra_usage: Option<ExtraUsage>,
}

/// Usage data for one rolling window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsagePeriod {
    /// Percentage of quota used (0.0 - 100.0+).
    ///
    /// Values over 100.0 indicate quota exceeded. `None` when the server
    /// sends `null` or omits the field.
    #[serde(default)]
    pub utilization: Option<f64>,

    /// When this window's quota resets.
    ///
    /// `None` when absent, `null`, or not parseable as ISO-8601.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub resets_at: Option<DateTime<Utc>>,
}

/// Extra usage billing information.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtraUsage {
    /// Cumulative extra usage in the current billing period, in cents.
    #[serde(default)]
    pub used_credits: Option<f64>,
}

impl UsageData {
    /// Parse a raw response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// ISO-8601 with fractional seconds, e.g. `2026-01-22T09:00:00.123456+00:00`.
const FRACTIONAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%#z";

/// ISO-8601 without fractional seconds, e.g. `2026-01-22T09:00:00Z`.
const WHOLE_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%#z";

fn parse_fractional(s: &str) -> Option<DateTime<Utc>> {
    // `%.f` also matches an empty fraction; require the dot so the two
    // attempts stay distinct.
    if !s.contains('.') {
        return None;
    }
    DateTime::parse_from_str(s, FRACTIONAL_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_whole_seconds(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, WHOLE_SECONDS_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an ISO-8601 timestamp as sent by the usage API.
///
/// Tries the fractional-seconds form first, then the whole-seconds form.
/// The first success wins; if both fail the result is `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    const ATTEMPTS: [fn(&str) -> Option<DateTime<Utc>>; 2] =
        [parse_fractional, parse_whole_seconds];

    let s = s.trim();
    ATTEMPTS.iter().find_map(|attempt| attempt(s))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
