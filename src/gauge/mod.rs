//! Circular gauge rendering as an abstract vector scene.
//!
//! A gauge is described by an ordered list of [`Primitive`]s in point
//! coordinates (origin top-left, y down). Angles are measured in degrees
//! clockwise from 12 o'clock. Drawing order is part of the contract:
//!
//! 1. full-circle track (red when the window is exhausted, faint otherwise)
//! 2. base arc from 12 o'clock (green when under pace, muted otherwise)
//! 3. overage arc continuing from the base arc, colored by drift
//! 4. pace-marker tick at the elapsed angle
//! 5. centered percentage label (omitted when exhausted)
//!
//! Without a pacing signal the ring is a single muted arc with no tick.
//!
//! [`raster`] turns a [`GaugeScene`] into pixels.

pub mod font;
pub mod raster;

use serde::Serialize;

use crate::overage::format_dollars;
use crate::pacing::{drift_color, label_color, Color};
use crate::snapshot::{DerivedUsage, WindowReading};

/// A point in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal offset from the left edge.
    pub x: f64,
    /// Vertical offset from the top edge.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point at `radius` from `self`, `angle_deg` clockwise from 12 o'clock.
    pub fn polar(self, radius: f64, angle_deg: f64) -> Self {
        let theta = angle_deg.to_radians();
        Self {
            x: self.x + radius * theta.sin(),
            y: self.y - radius * theta.cos(),
        }
    }
}

/// One drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Primitive {
    /// Full-circle stroke.
    Track {
        center: Point,
        radius: f64,
        stroke: f64,
        color: Color,
    },
    /// Clockwise arc stroke with round caps.
    Arc {
        center: Point,
        radius: f64,
        stroke: f64,
        start_deg: f64,
        sweep_deg: f64,
        color: Color,
    },
    /// Straight radial mark with round caps.
    Tick {
        from: Point,
        to: Point,
        width: f64,
        color: Color,
    },
    /// Text centered on `center`, `size` points tall.
    Label {
        center: Point,
        text: String,
        size: f64,
        color: Color,
    },
}

impl Primitive {
    /// Compositing layer when several gauges share a canvas.
    fn layer(&self) -> u8 {
        match self {
            Primitive::Track { .. } => 0,
            Primitive::Arc { .. } | Primitive::Tick { .. } => 1,
            Primitive::Label { .. } => 2,
        }
    }
}

/// Ring dimensions for one gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeStyle {
    /// Ring radius, measured to the middle of the stroke.
    pub radius: f64,
    /// Stroke width of the ring.
    pub stroke: f64,
    /// Point size of the centered label.
    pub label_size: f64,
}

impl GaugeStyle {
    /// Compact gauge used in the menu-bar icon.
    pub const MENU_BAR: GaugeStyle = GaugeStyle {
        radius: 10.0,
        stroke: 3.5,
        label_size: 8.5,
    };

    /// Large gauge used in the detail popover.
    pub const POPOVER: GaugeStyle = GaugeStyle {
        radius: 25.0,
        stroke: 6.0,
        label_size: 18.0,
    };

    /// Outer diameter including the stroke.
    pub fn diameter(&self) -> f64 {
        (self.radius + self.stroke / 2.0) * 2.0
    }

    /// Half-length of the pace tick on each side of the ring.
    pub fn tick_reach(&self) -> f64 {
        self.stroke * 0.7
    }

    /// Line width of the pace tick.
    pub fn tick_width(&self) -> f64 {
        (self.stroke * 0.4).max(1.2)
    }
}

/// Inputs for one gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeInput {
    /// Raw utilization; may exceed 100.
    pub pct: f64,
    /// Elapsed percentage of the window.
    pub elapsed_pct: Option<f64>,
    /// Rounded drift.
    pub drift_pct: Option<f64>,
    /// Whether the window is exhausted.
    pub is_full: bool,
}

impl From<WindowReading> for GaugeInput {
    fn from(reading: WindowReading) -> Self {
        Self {
            pct: reading.pct,
            elapsed_pct: reading.pacing.elapsed_pct,
            drift_pct: reading.pacing.drift_pct,
            is_full: reading.is_full,
        }
    }
}

/// How a ring splits into its on-pace and over-pace segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSplit {
    /// Usage is strictly below the elapsed mark.
    pub under_pace: bool,
    /// Percentage drawn as the first segment.
    pub base_portion: f64,
    /// Percentage drawn past the elapsed mark.
    pub over_portion: f64,
}

impl RingSplit {
    /// Split `pct` (clamped to `[0, 100]`) around `elapsed_pct`.
    pub fn new(pct: f64, elapsed_pct: f64) -> Self {
        let usage = pct.clamp(0.0, 100.0);
        let under_pace = usage < elapsed_pct;
        if under_pace {
            Self {
                under_pace,
                base_portion: usage,
                over_portion: 0.0,
            }
        } else {
            Self {
                under_pace,
                base_portion: usage.min(elapsed_pct),
                over_portion: (usage - elapsed_pct).max(0.0),
            }
        }
    }
}

fn pct_to_deg(pct: f64) -> f64 {
    pct / 100.0 * 360.0
}

/// Primitives for one gauge centered at `center`.
pub fn gauge_primitives(input: &GaugeInput, center: Point, style: &GaugeStyle) -> Vec<Primitive> {
    let mut out = Vec::with_capacity(5);
    let ring_arc = |start_deg: f64, sweep_deg: f64, color: Color| Primitive::Arc {
        center,
        radius: style.radius,
        stroke: style.stroke,
        start_deg,
        sweep_deg,
        color,
    };

    out.push(Primitive::Track {
        center,
        radius: style.radius,
        stroke: style.stroke,
        color: if input.is_full { Color::Red } else { Color::Track },
    });

    match (input.elapsed_pct, input.drift_pct) {
        (Some(elapsed), Some(drift)) => {
            // An exhausted window is shown as the solid red track alone.
            if !input.is_full {
                let split = RingSplit::new(input.pct, elapsed);
                if split.base_portion > 0.0 {
                    let color = if split.under_pace {
                        Color::Green
                    } else {
                        Color::Muted
                    };
                    out.push(ring_arc(0.0, pct_to_deg(split.base_portion), color));
                }
                if split.over_portion > 0.0 {
                    out.push(ring_arc(
                        pct_to_deg(split.base_portion),
                        pct_to_deg(split.over_portion),
                        drift_color(drift),
                    ));
                }
            }

            let angle = pct_to_deg(elapsed);
            out.push(Primitive::Tick {
                from: center.polar(style.radius - style.tick_reach(), angle),
                to: center.polar(style.radius + style.tick_reach(), angle),
                width: style.tick_width(),
                color: Color::TickMark,
            });
        }
        _ => {
            let usage = input.pct.clamp(0.0, 100.0);
            if !input.is_full && usage > 0.0 {
                out.push(ring_arc(0.0, pct_to_deg(usage), Color::Muted));
            }
        }
    }

    if !input.is_full {
        out.push(Primitive::Label {
            center,
            text: format!("{}", input.pct.round() as i64),
            size: style.label_size,
            color: label_color(input.drift_pct, input.is_full),
        });
    }

    out
}

/// A fixed-size canvas and the primitives drawn on it, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeScene {
    /// Canvas width in points.
    pub width: f64,
    /// Canvas height in points.
    pub height: f64,
    /// Drawing operations, back to front.
    pub primitives: Vec<Primitive>,
}

impl GaugeScene {
    /// Labels in drawing order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Side length of the popover gauge canvas.
pub const POPOVER_CANVAS: f64 = 64.0;

/// A single popover gauge on a square canvas.
pub fn popover_gauge(input: &GaugeInput) -> GaugeScene {
    let center = Point::new(POPOVER_CANVAS / 2.0, POPOVER_CANVAS / 2.0);
    GaugeScene {
        width: POPOVER_CANVAS,
        height: POPOVER_CANVAS,
        primitives: gauge_primitives(input, center, &GaugeStyle::POPOVER),
    }
}

/// Height of the menu-bar icon.
pub const MENU_BAR_HEIGHT: f64 = 24.0;

/// Horizontal space between the two menu-bar gauges.
pub const MENU_BAR_GAP: f64 = 4.0;

/// Point size of the overage label next to the gauges.
pub const OVERAGE_LABEL_SIZE: f64 = 9.0;

/// The menu-bar icon: the 5-hour and 7-day gauges side by side.
///
/// `derived` is `None` before the first successful fetch, which draws the two
/// empty tracks only. When either window is exhausted, the overage spent since
/// the daily baseline (`overage_delta_cents`) is shown in red to the right.
pub fn menu_bar_icon(derived: Option<&DerivedUsage>, overage_delta_cents: f64) -> GaugeScene {
    let style = GaugeStyle::MENU_BAR;
    let circle = style.diameter();
    let cy = MENU_BAR_HEIGHT / 2.0;
    let centers = [
        Point::new(circle / 2.0, cy),
        Point::new(circle + MENU_BAR_GAP + circle / 2.0, cy),
    ];
    let gauges_width = circle * 2.0 + MENU_BAR_GAP;

    let Some(derived) = derived else {
        let primitives = centers
            .iter()
            .map(|&center| Primitive::Track {
                center,
                radius: style.radius,
                stroke: style.stroke,
                color: Color::Track,
            })
            .collect();
        return GaugeScene {
            width: gauges_width,
            height: MENU_BAR_HEIGHT,
            primitives,
        };
    };

    let mut primitives: Vec<Primitive> = derived
        .readings()
        .iter()
        .zip(centers)
        .flat_map(|(reading, center)| gauge_primitives(&GaugeInput::from(*reading), center, &style))
        .collect();
    // Both tracks, then both rings, then both labels; stable within a layer
    primitives.sort_by_key(Primitive::layer);

    let mut width = gauges_width;
    if derived.any_full() {
        let text = format!("+{}", format_dollars(overage_delta_cents));
        let text_width = font::text_width(&text, OVERAGE_LABEL_SIZE);
        let left = gauges_width + 2.0;
        primitives.push(Primitive::Label {
            center: Point::new(left + text_width / 2.0, cy),
            text,
            size: OVERAGE_LABEL_SIZE,
            color: Color::Red,
        });
        width += text_width + 4.0;
    }

    GaugeScene {
        width,
        height: MENU_BAR_HEIGHT,
        primitives,
    }
}
