//! The immutable per-poll usage snapshot and the values derived from it.

use chrono::{DateTime, Utc};
use claude_usage::UsageData;
use serde::Serialize;

use crate::pacing::{is_full, DerivedPacing, Window};

/// One successful poll of the usage API, normalised for the core.
///
/// Percentages are rounded to whole numbers; every missing value is 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UsageSnapshot {
    /// Utilization of the 5-hour window.
    pub five_hour_pct: f64,
    /// Utilization of the 7-day window.
    pub seven_day_pct: f64,
    /// Reset instant of the 5-hour window.
    pub resets_at: Option<DateTime<Utc>>,
    /// Reset instant of the 7-day window.
    pub seven_day_resets_at: Option<DateTime<Utc>>,
    /// Cumulative overage cost in cents for the billing period.
    pub extra_usage_cents: f64,
}

impl UsageSnapshot {
    /// Normalise a parsed API response.
    pub fn from_usage_data(data: &UsageData) -> Self {
        let seven_day = data.seven_day.clone().unwrap_or_default();
        Self {
            five_hour_pct: data.five_hour.utilization.unwrap_or(0.0).round(),
            seven_day_pct: seven_day.utilization.unwrap_or(0.0).round(),
            resets_at: data.five_hour.resets_at,
            seven_day_resets_at: seven_day.resets_at,
            extra_usage_cents: data
                .extra_usage
                .as_ref()
                .and_then(|extra| extra.used_credits)
                .unwrap_or(0.0),
        }
    }

    /// Utilization for `window`.
    pub fn pct(&self, window: Window) -> f64 {
        match window {
            Window::FiveHour => self.five_hour_pct,
            Window::SevenDay => self.seven_day_pct,
        }
    }

    /// Reset instant for `window`.
    pub fn resets_at(&self, window: Window) -> Option<DateTime<Utc>> {
        match window {
            Window::FiveHour => self.resets_at,
            Window::SevenDay => self.seven_day_resets_at,
        }
    }

    /// Pacing signal for one window at `now`.
    pub fn pacing(&self, window: Window, now: DateTime<Utc>) -> DerivedPacing {
        DerivedPacing::compute(self.pct(window), self.resets_at(window), window.hours(), now)
    }

    /// Derived values for both windows at `now`.
    pub fn derive(&self, now: DateTime<Utc>) -> DerivedUsage {
        DerivedUsage {
            five_hour: WindowReading::new(self, Window::FiveHour, now),
            seven_day: WindowReading::new(self, Window::SevenDay, now),
        }
    }
}

impl From<&UsageData> for UsageSnapshot {
    fn from(data: &UsageData) -> Self {
        Self::from_usage_data(data)
    }
}

/// Everything the renderer needs about one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowReading {
    /// Which window this is.
    pub window: Window,
    /// Raw (unclamped) utilization.
    pub pct: f64,
    /// Elapsed and drift.
    pub pacing: DerivedPacing,
    /// `pct >= 100`.
    pub is_full: bool,
}

impl WindowReading {
    fn new(snapshot: &UsageSnapshot, window: Window, now: DateTime<Utc>) -> Self {
        let pct = snapshot.pct(window);
        Self {
            window,
            pct,
            pacing: snapshot.pacing(window, now),
            is_full: is_full(pct),
        }
    }
}

/// Derived readings for both windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedUsage {
    /// The 5-hour window.
    pub five_hour: WindowReading,
    /// The 7-day window.
    pub seven_day: WindowReading,
}

impl DerivedUsage {
    /// Whether either window is exhausted.
    pub fn any_full(&self) -> bool {
        self.five_hour.is_full || self.seven_day.is_full
    }

    /// Both readings, short window first.
    pub fn readings(&self) -> [WindowReading; 2] {
        [self.five_hour, self.seven_day]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{drift_color, Color};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn from_usage_data_rounds_and_defaults() {
        let data = UsageData::from_json(
            r#"{
                "five_hour": {"utilization": 39.6, "resets_at": "2026-05-04T14:00:00Z"},
                "seven_day": {"utilization": null}
            }"#,
        )
        .expect("valid body");
        let snapshot = UsageSnapshot::from_usage_data(&data);
        assert_eq!(snapshot.five_hour_pct, 40.0);
        assert_eq!(snapshot.seven_day_pct, 0.0);
        assert_eq!(snapshot.resets_at, Some(now() + Duration::hours(2)));
        assert_eq!(snapshot.seven_day_resets_at, None);
        assert_eq!(snapshot.extra_usage_cents, 0.0);
    }

    #[test]
    fn from_usage_data_reads_used_credits() {
        let data = UsageData::from_json(
            r#"{
                "five_hour": {"utilization": 100.0},
                "extra_usage": {"is_enabled": true, "used_credits": 412.5}
            }"#,
        )
        .expect("valid body");
        let snapshot = UsageSnapshot::from(&data);
        assert_eq!(snapshot.extra_usage_cents, 412.5);
    }

    #[test]
    fn end_to_end_derivation() {
        let snapshot = UsageSnapshot {
            five_hour_pct: 40.0,
            seven_day_pct: 60.0,
            resets_at: Some(now() + Duration::hours(2)),
            seven_day_resets_at: Some(now() + Duration::hours(50)),
            extra_usage_cents: 0.0,
        };
        let derived = snapshot.derive(now());

        let five = derived.five_hour;
        assert!((five.pacing.elapsed_pct.expect("elapsed") - 60.0).abs() < 0.01);
        assert_eq!(five.pacing.drift_pct, Some(-20.0));
        assert_eq!(drift_color(-20.0), Color::Green);
        assert!(!five.is_full);

        let seven = derived.seven_day;
        assert!(seven.pacing.has_signal());
        assert!(!derived.any_full());
    }

    #[test]
    fn full_state_uses_unclamped_pct() {
        let snapshot = UsageSnapshot {
            five_hour_pct: 120.0,
            ..UsageSnapshot::default()
        };
        let derived = snapshot.derive(now());
        assert!(derived.five_hour.is_full);
        assert_eq!(derived.five_hour.pct, 120.0);
        assert!(derived.any_full());
    }
}
