//! Pacing math: how much of a usage window has elapsed, and how far actual
//! usage has drifted from an even burn.
//!
//! All functions are pure. The `*_at` variants take the current instant
//! explicitly; the plain variants read the system clock.
//!
//! # Color thresholds
//!
//! | Drift (usage% - elapsed%) | Color     |
//! |---------------------------|-----------|
//! | > 30                      | Red       |
//! | > 10 and <= 30            | Orange    |
//! | < -10                     | Green     |
//! | otherwise                 | Secondary |
//!
//! The boundaries are exclusive: a drift of exactly 30 is orange, exactly 10
//! is neutral.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Drift strictly above this is red.
pub const DRIFT_RED_ABOVE: f64 = 30.0;

/// Drift strictly above this (and not red) is orange.
pub const DRIFT_ORANGE_ABOVE: f64 = 10.0;

/// Drift strictly below this is green.
pub const DRIFT_GREEN_BELOW: f64 = -10.0;

/// Utilization at or above this marks a window as exhausted.
pub const FULL_PCT: f64 = 100.0;

/// The two rolling windows the usage API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Window {
    /// The short 5-hour window.
    FiveHour,
    /// The long 7-day window.
    SevenDay,
}

impl Window {
    /// Window length in hours.
    pub const fn hours(self) -> f64 {
        match self {
            Window::FiveHour => 5.0,
            Window::SevenDay => 168.0,
        }
    }

    /// Human-readable title shown above the popover gauge.
    pub const fn title(self) -> &'static str {
        match self {
            Window::FiveHour => "5 hours",
            Window::SevenDay => "7 days",
        }
    }
}

/// Semantic colors. Mapping to concrete RGBA happens in the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    /// Exhausted window or severe over-pace.
    Red,
    /// Moderate over-pace.
    Orange,
    /// Comfortably under pace.
    Green,
    /// Neutral secondary text.
    Secondary,
    /// Default foreground text.
    Label,
    /// Faint full-circle track behind the arcs.
    Track,
    /// Muted tone for the on-pace portion of a ring.
    Muted,
    /// The pace marker tick.
    TickMark,
}

/// Pacing signal for one window, computed fresh on every render.
///
/// `drift_pct` is only ever `Some` when `elapsed_pct` is `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DerivedPacing {
    /// Percentage of the window already elapsed.
    pub elapsed_pct: Option<f64>,
    /// Rounded `usage% - elapsed%`.
    pub drift_pct: Option<f64>,
}

impl DerivedPacing {
    /// Compute elapsed and drift for `usage_pct` against `window_hours`.
    pub fn compute(
        usage_pct: f64,
        resets_at: Option<DateTime<Utc>>,
        window_hours: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let elapsed_pct = elapsed_pct_at(resets_at, window_hours, now);
        let drift_pct = elapsed_pct.map(|elapsed| (usage_pct - elapsed).round());
        Self {
            elapsed_pct,
            drift_pct,
        }
    }

    /// Whether a pace marker and two-segment ring can be drawn.
    pub fn has_signal(&self) -> bool {
        self.elapsed_pct.is_some() && self.drift_pct.is_some()
    }
}

/// Percentage of the window `[resets_at - window, resets_at]` elapsed at `now`.
///
/// Returns `None` when `resets_at` is unknown, when the window has not yet
/// started, or when the reset instant is already in the past. Both ends of the
/// window are inclusive.
pub fn elapsed_pct_at(
    resets_at: Option<DateTime<Utc>>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Option<f64> {
    let resets_at = resets_at?;
    let window_secs = window_hours * 3600.0;
    if window_secs <= 0.0 || !window_secs.is_finite() {
        return None;
    }

    let until_reset = (resets_at - now).num_milliseconds() as f64 / 1000.0;
    if until_reset < 0.0 || until_reset > window_secs {
        return None;
    }

    Some((window_secs - until_reset) / window_secs * 100.0)
}

/// [`elapsed_pct_at`] against the system clock.
pub fn elapsed_pct(resets_at: Option<DateTime<Utc>>, window_hours: f64) -> Option<f64> {
    elapsed_pct_at(resets_at, window_hours, Utc::now())
}

/// Rounded `usage_pct - elapsed%`, or `None` when there is no pacing signal.
///
/// Positive means usage is ahead of pace, negative means behind.
pub fn drift_pct_at(
    usage_pct: f64,
    resets_at: Option<DateTime<Utc>>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Option<f64> {
    DerivedPacing::compute(usage_pct, resets_at, window_hours, now).drift_pct
}

/// [`drift_pct_at`] against the system clock.
pub fn drift_pct(
    usage_pct: f64,
    resets_at: Option<DateTime<Utc>>,
    window_hours: f64,
) -> Option<f64> {
    drift_pct_at(usage_pct, resets_at, window_hours, Utc::now())
}

/// Color for a drift value.
pub fn drift_color(drift: f64) -> Color {
    if drift > DRIFT_RED_ABOVE {
        Color::Red
    } else if drift > DRIFT_ORANGE_ABOVE {
        Color::Orange
    } else if drift < DRIFT_GREEN_BELOW {
        Color::Green
    } else {
        Color::Secondary
    }
}

/// Whether `pct` marks the window as exhausted.
pub fn is_full(pct: f64) -> bool {
    pct >= FULL_PCT
}

/// Color for the centered percentage label.
///
/// `is_full` is the window's exhausted flag (see [`is_full`]); when set the
/// label is red regardless of drift. Under-pace drift does not tint the
/// label, only over-pace does.
pub fn label_color(drift: Option<f64>, is_full: bool) -> Color {
    if is_full {
        return Color::Red;
    }
    match drift {
        Some(d) if d > DRIFT_RED_ABOVE => Color::Red,
        Some(d) if d > DRIFT_ORANGE_ABOVE => Color::Orange,
        _ => Color::Label,
    }
}
