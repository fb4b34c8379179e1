//! Overage (extra usage) tracking relative to a daily baseline.
//!
//! The usage API only reports the cumulative overage for the billing period.
//! [`OverageTracker`] anchors a baseline the first time overage is seen each
//! calendar day and reports spend since then, plus an hourly burn rate.
//!
//! The baseline is re-anchored when:
//! - the local calendar day changes, or
//! - the reported cumulative value drops below the anchor (billing period
//!   rolled over on the server).
//!
//! It is cleared entirely when the reported value is zero.

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::snapshot::UsageSnapshot;

/// Zero-point for computing today's incremental overage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverageBaseline {
    /// When the baseline was established.
    pub anchored_at: DateTime<Local>,
    /// `extra_usage_cents` at that moment.
    pub anchor_cents: f64,
}

impl OverageBaseline {
    /// Calendar day the baseline belongs to.
    pub fn anchor_date(&self) -> NaiveDate {
        self.anchored_at.date_naive()
    }
}

/// Owns the overage baseline. Only the refresh path calls [`observe`];
/// rendering only reads.
///
/// [`observe`]: OverageTracker::observe
#[derive(Debug, Clone, Default)]
pub struct OverageTracker {
    baseline: Option<OverageBaseline>,
}

impl OverageTracker {
    /// Create a tracker with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline, if overage is active.
    pub fn baseline(&self) -> Option<&OverageBaseline> {
        self.baseline.as_ref()
    }

    /// Update the baseline from a freshly applied snapshot.
    pub fn observe(&mut self, snapshot: &UsageSnapshot, now: DateTime<Local>) {
        let cents = snapshot.extra_usage_cents;

        if cents <= 0.0 {
            if self.baseline.take().is_some() {
                debug!("overage cleared, dropping baseline");
            }
            return;
        }

        let fresh = OverageBaseline {
            anchored_at: now,
            anchor_cents: cents,
        };

        match self.baseline {
            None => {
                debug!(anchor_cents = cents, "overage baseline anchored");
                self.baseline = Some(fresh);
            }
            Some(current) if current.anchor_date() != now.date_naive() => {
                debug!(
                    previous_day = %current.anchor_date(),
                    anchor_cents = cents,
                    "calendar day changed, re-anchoring overage baseline"
                );
                self.baseline = Some(fresh);
            }
            Some(current) if cents < current.anchor_cents => {
                debug!(
                    previous_cents = current.anchor_cents,
                    anchor_cents = cents,
                    "overage counter went backwards, re-anchoring baseline"
                );
                self.baseline = Some(fresh);
            }
            Some(_) => {}
        }
    }

    /// Cents accumulated since the baseline, floored at 0.
    pub fn current_delta(&self, snapshot: &UsageSnapshot) -> f64 {
        self.baseline
            .map(|b| (snapshot.extra_usage_cents - b.anchor_cents).max(0.0))
            .unwrap_or(0.0)
    }

    /// Cents per hour since the baseline was anchored.
    ///
    /// `None` without a baseline or when no time has passed (including a
    /// clock that moved backwards). Unsmoothed: short elapsed spans are noisy,
    /// and callers should only display positive rates.
    pub fn current_hourly_rate(
        &self,
        snapshot: &UsageSnapshot,
        now: DateTime<Local>,
    ) -> Option<f64> {
        let baseline = self.baseline?;
        let hours = (now - baseline.anchored_at).num_milliseconds() as f64 / 3_600_000.0;
        if hours <= 0.0 {
            return None;
        }
        Some((snapshot.extra_usage_cents - baseline.anchor_cents) / hours)
    }
}

/// Format cents as dollars, e.g. `1234.0` → `$12.34`.
pub fn format_dollars(cents: f64) -> String {
    format!("${:.2}", cents / 100.0)
}
