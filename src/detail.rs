//! The detail view: per-window drift and reset text, the overage line, and
//! the two large popover gauges.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gauge::{popover_gauge, GaugeInput, GaugeScene};
use crate::overage::format_dollars;
use crate::pacing::{drift_color, Color, Window};
use crate::snapshot::{UsageSnapshot, WindowReading};

/// Placeholder for a value that is not known.
pub const UNKNOWN: &str = "--";

/// One line of text and its color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailLine {
    pub text: String,
    pub color: Color,
}

impl DetailLine {
    fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Detail for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowDetail {
    pub window: Window,
    /// Rounded utilization shown in the gauge.
    pub pct: f64,
    /// `"<drift> · <reset>"`, or `--` without a pacing signal.
    pub line: DetailLine,
    /// Large gauge for the popover.
    #[serde(skip)]
    pub gauge: GaugeScene,
}

/// Everything the popover shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub five_hour: WindowDetail,
    pub seven_day: WindowDetail,
    /// Cumulative overage and, when positive, the hourly burn rate.
    pub overage: DetailLine,
}

impl DetailView {
    /// Build the view from the last applied snapshot.
    ///
    /// With no snapshot yet, both windows show `--` and empty gauges.
    pub fn build(
        snapshot: Option<&UsageSnapshot>,
        hourly_rate: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        let empty = UsageSnapshot::default();
        let current = snapshot.unwrap_or(&empty);
        let derived = current.derive(now);

        let window = |reading: WindowReading| WindowDetail {
            window: reading.window,
            pct: reading.pct,
            line: window_line(snapshot.map(|_| reading), current, now),
            gauge: popover_gauge(&GaugeInput::from(reading)),
        };

        Self {
            five_hour: window(derived.five_hour),
            seven_day: window(derived.seven_day),
            overage: overage_line(current.extra_usage_cents, hourly_rate),
        }
    }

    /// Both window details, short window first.
    pub fn windows(&self) -> [&WindowDetail; 2] {
        [&self.five_hour, &self.seven_day]
    }
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for detail in self.windows() {
            writeln!(
                f,
                "{:<8} {:>3}%  {}",
                detail.window.title(),
                detail.pct.round() as i64,
                detail.line.text
            )?;
        }
        write!(f, "{}", self.overage.text)
    }
}

fn window_line(
    reading: Option<WindowReading>,
    snapshot: &UsageSnapshot,
    now: DateTime<Utc>,
) -> DetailLine {
    let Some(reading) = reading else {
        return DetailLine::new(UNKNOWN, Color::Secondary);
    };
    let Some(drift) = reading.pacing.drift_pct else {
        return DetailLine::new(UNKNOWN, Color::Secondary);
    };

    let reset = snapshot
        .resets_at(reading.window)
        .map(|at| format_relative_time(at, now))
        .unwrap_or_else(|| UNKNOWN.to_string());
    DetailLine::new(
        format!("{} · {}", format_drift(drift), reset),
        drift_color(drift),
    )
}

fn overage_line(extra_usage_cents: f64, hourly_rate: Option<f64>) -> DetailLine {
    let mut text = format!("extra  {}", format_dollars(extra_usage_cents));
    if let Some(rate) = hourly_rate.filter(|r| *r > 0.0) {
        text.push_str(&format!("  ({}/h)", format_dollars(rate)));
    }
    DetailLine::new(text, Color::Secondary)
}

/// Signed whole-number drift: `+0`, `+12`, `-7`.
pub fn format_drift(drift: f64) -> String {
    format!("{:+}", drift as i64)
}

/// Compact time until `target`: `now`, `42min`, `3h05`, `3h`, `2d4h`, `2d`.
pub fn format_relative_time(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let ms = (target - now).num_milliseconds();
    if ms <= 0 {
        return "now".to_string();
    }

    let minutes = ms / 60_000;
    if minutes < 60 {
        return format!("{minutes}min");
    }

    let hours = minutes / 60;
    if hours >= 24 {
        let (days, rem) = (hours / 24, hours % 24);
        return if rem > 0 {
            format!("{days}d{rem}h")
        } else {
            format!("{days}d")
        };
    }

    match minutes % 60 {
        0 => format!("{hours}h"),
        m => format!("{hours}h{m:02}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn snapshot() -> UsageSnapshot {
        UsageSnapshot {
            five_hour_pct: 40.0,
            seven_day_pct: 60.0,
            resets_at: Some(now() + Duration::hours(2)),
            seven_day_resets_at: Some(now() + Duration::hours(50)),
            extra_usage_cents: 0.0,
        }
    }

    #[test]
    fn relative_time_buckets() {
        let t = now();
        assert_eq!(format_relative_time(t, t), "now");
        assert_eq!(format_relative_time(t - Duration::minutes(3), t), "now");
        assert_eq!(format_relative_time(t + Duration::seconds(59), t), "0min");
        assert_eq!(format_relative_time(t + Duration::minutes(42), t), "42min");
        assert_eq!(format_relative_time(t + Duration::minutes(185), t), "3h05");
        assert_eq!(format_relative_time(t + Duration::hours(3), t), "3h");
        assert_eq!(format_relative_time(t + Duration::hours(52), t), "2d4h");
        assert_eq!(format_relative_time(t + Duration::hours(48), t), "2d");
    }

    #[test]
    fn drift_has_explicit_sign() {
        assert_eq!(format_drift(0.0), "+0");
        assert_eq!(format_drift(12.0), "+12");
        assert_eq!(format_drift(-7.0), "-7");
    }

    #[test]
    fn window_lines_show_drift_and_reset() {
        let view = DetailView::build(Some(&snapshot()), None, now());
        assert_eq!(view.five_hour.line.text, "-20 · 2h");
        assert_eq!(view.five_hour.line.color, Color::Green);
        // 118 of 168 hours elapsed: 70%, drift -10 is still neutral
        assert_eq!(view.seven_day.line.text, "-10 · 2d2h");
        assert_eq!(view.seven_day.line.color, Color::Secondary);
    }

    #[test]
    fn without_snapshot_everything_is_unknown() {
        let view = DetailView::build(None, None, now());
        for detail in view.windows() {
            assert_eq!(detail.line, DetailLine::new(UNKNOWN, Color::Secondary));
            assert_eq!(detail.gauge.labels().collect::<Vec<_>>(), ["0"]);
        }
        assert_eq!(view.overage.text, "extra  $0.00");
    }

    #[test]
    fn stale_reset_shows_unknown_line() {
        let stale = UsageSnapshot {
            resets_at: Some(now() - Duration::minutes(5)),
            ..snapshot()
        };
        let view = DetailView::build(Some(&stale), None, now());
        assert_eq!(view.five_hour.line.text, UNKNOWN);
        assert_eq!(view.five_hour.line.color, Color::Secondary);
    }

    #[test]
    fn overage_line_includes_positive_rate_only() {
        let spent = UsageSnapshot {
            extra_usage_cents: 1234.0,
            ..snapshot()
        };
        let view = DetailView::build(Some(&spent), Some(250.0), now());
        assert_eq!(view.overage.text, "extra  $12.34  ($2.50/h)");

        let view = DetailView::build(Some(&spent), Some(0.0), now());
        assert_eq!(view.overage.text, "extra  $12.34");

        let view = DetailView::build(Some(&spent), Some(-10.0), now());
        assert_eq!(view.overage.text, "extra  $12.34");
    }

    #[test]
    fn popover_gauges_follow_snapshot() {
        let view = DetailView::build(Some(&snapshot()), None, now());
        assert_eq!(view.five_hour.gauge.labels().collect::<Vec<_>>(), ["40"]);
        assert_eq!(view.seven_day.gauge.labels().collect::<Vec<_>>(), ["60"]);
    }

    #[test]
    fn display_lists_windows_then_overage() {
        let view = DetailView::build(Some(&snapshot()), None, now());
        let text = view.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("5 hours"));
        assert!(lines[0].ends_with("-20 · 2h"));
        assert!(lines[1].starts_with("7 days"));
        assert_eq!(lines[2], "extra  $0.00");
    }

    #[test]
    fn json_omits_gauge_geometry() {
        let view = DetailView::build(Some(&snapshot()), None, now());
        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["five_hour"]["line"]["text"], "-20 · 2h");
        assert_eq!(json["five_hour"]["line"]["color"], "green");
        assert!(json["five_hour"].get("gauge").is_none());
    }
}
