//! Rasterizes a [`GaugeScene`] into an RGBA image.
//!
//! Strokes are anti-aliased by their exact distance to the centre line, with a
//! one-pixel ramp. Labels are supersampled from the bitmap font.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::font;
use super::{GaugeScene, Point, Primitive};
use crate::pacing::Color;

/// Largest accepted device-pixel scale.
pub const MAX_SCALE: f64 = 8.0;

/// Errors from turning a scene into image bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Scale outside `(0, MAX_SCALE]`.
    #[error("Scale {0} is out of range (must be greater than 0 and at most {MAX_SCALE})")]
    Scale(f64),

    /// PNG encoding failed.
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Background the icon is composited over.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    /// Dark menu bar, light text.
    #[default]
    Dark,
    /// Light menu bar, dark text.
    Light,
}

/// Concrete RGBA values for the semantic [`Color`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    label: [u8; 3],
    secondary: [u8; 3],
}

impl Palette {
    /// Palette for a theme.
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                label: [255, 255, 255],
                secondary: [152, 152, 157],
            },
            Theme::Light => Self {
                label: [0, 0, 0],
                secondary: [138, 138, 142],
            },
        }
    }

    /// RGBA for `color`.
    pub fn rgba(&self, color: Color) -> Rgba<u8> {
        let with_alpha = |[r, g, b]: [u8; 3], alpha: f64| Rgba([r, g, b, (alpha * 255.0) as u8]);
        match color {
            Color::Red => Rgba([255, 59, 48, 255]),
            Color::Orange => Rgba([255, 149, 0, 255]),
            Color::Green => Rgba([52, 199, 89, 255]),
            Color::Secondary => with_alpha(self.secondary, 1.0),
            Color::Label => with_alpha(self.label, 1.0),
            Color::Track => with_alpha([128, 128, 128], 0.2),
            Color::Muted => with_alpha(self.secondary, 0.5),
            Color::TickMark => with_alpha(self.label, 0.7),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}

/// Samples per axis when rasterizing labels.
const LABEL_SUPERSAMPLE: usize = 4;

/// Whether `scale` is a usable device-pixel scale.
pub fn is_valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0 && scale <= MAX_SCALE
}

/// Rasterize `scene` at `scale` device pixels per point.
///
/// # Errors
///
/// [`RenderError::Scale`] unless `0 < scale <= MAX_SCALE`.
pub fn rasterize(
    scene: &GaugeScene,
    palette: &Palette,
    scale: f64,
) -> Result<RgbaImage, RenderError> {
    if !is_valid_scale(scale) {
        return Err(RenderError::Scale(scale));
    }
    let width = (scene.width * scale).ceil().max(1.0) as u32;
    let height = (scene.height * scale).ceil().max(1.0) as u32;
    let mut canvas = RgbaImage::new(width, height);

    for primitive in &scene.primitives {
        draw(&mut canvas, primitive, palette, scale);
    }
    Ok(canvas)
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn draw(canvas: &mut RgbaImage, primitive: &Primitive, palette: &Palette, scale: f64) {
    match primitive {
        Primitive::Track {
            center,
            radius,
            stroke,
            color,
        } => {
            let (c, r, half) = (scaled(*center, scale), radius * scale, stroke * scale / 2.0);
            fill(canvas, palette.rgba(*color), ring_bounds(c, r + half), |p| {
                stroke_coverage(((p.x - c.x).hypot(p.y - c.y) - r).abs(), half)
            });
        }
        Primitive::Arc {
            center,
            radius,
            stroke,
            start_deg,
            sweep_deg,
            color,
        } => {
            if *sweep_deg <= 0.0 {
                return;
            }
            let (c, r, half) = (scaled(*center, scale), radius * scale, stroke * scale / 2.0);
            let (start, sweep) = (*start_deg, sweep_deg.min(360.0));
            fill(canvas, palette.rgba(*color), ring_bounds(c, r + half), |p| {
                stroke_coverage(arc_distance(p, c, r, start, sweep), half)
            });
        }
        Primitive::Tick {
            from,
            to,
            width,
            color,
        } => {
            let (a, b, half) = (scaled(*from, scale), scaled(*to, scale), width * scale / 2.0);
            let bounds = Bounds {
                min_x: a.x.min(b.x) - half - 1.0,
                min_y: a.y.min(b.y) - half - 1.0,
                max_x: a.x.max(b.x) + half + 1.0,
                max_y: a.y.max(b.y) + half + 1.0,
            };
            fill(canvas, palette.rgba(*color), bounds, |p| {
                stroke_coverage(segment_distance(p, a, b), half)
            });
        }
        Primitive::Label {
            center,
            text,
            size,
            color,
        } => draw_label(canvas, scaled(*center, scale), text, size * scale, palette.rgba(*color)),
    }
}

fn draw_label(canvas: &mut RgbaImage, center: Point, text: &str, size: f64, color: Rgba<u8>) {
    if text.is_empty() || size <= 0.0 {
        return;
    }
    let w = font::text_width(text, size);
    let h = font::text_height(size);
    let origin = Point::new(center.x - w / 2.0, center.y - h / 2.0);
    let bounds = Bounds {
        min_x: origin.x,
        min_y: origin.y,
        max_x: origin.x + w,
        max_y: origin.y + h,
    };

    let n = LABEL_SUPERSAMPLE;
    fill(canvas, color, bounds, |p| {
        // `p` is the pixel centre; sample an n×n grid inside the pixel
        let mut hits = 0;
        for sy in 0..n {
            for sx in 0..n {
                let x = p.x - 0.5 + (sx as f64 + 0.5) / n as f64 - origin.x;
                let y = p.y - 0.5 + (sy as f64 + 0.5) / n as f64 - origin.y;
                if font::covers(text, size, x, y) {
                    hits += 1;
                }
            }
        }
        hits as f64 / (n * n) as f64
    });
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

fn ring_bounds(center: Point, outer: f64) -> Bounds {
    Bounds {
        min_x: center.x - outer - 1.0,
        min_y: center.y - outer - 1.0,
        max_x: center.x + outer + 1.0,
        max_y: center.y + outer + 1.0,
    }
}

fn scaled(p: Point, scale: f64) -> Point {
    Point::new(p.x * scale, p.y * scale)
}

/// Coverage of a stroke of half-width `half` at `distance` from its centre line.
fn stroke_coverage(distance: f64, half: f64) -> f64 {
    (half - distance + 0.5).clamp(0.0, 1.0)
}

/// Distance from `p` to a clockwise arc starting at `start_deg` from 12 o'clock.
fn arc_distance(p: Point, center: Point, radius: f64, start_deg: f64, sweep_deg: f64) -> f64 {
    let (dx, dy) = (p.x - center.x, p.y - center.y);
    if sweep_deg >= 360.0 {
        return (dx.hypot(dy) - radius).abs();
    }

    let angle = dx.atan2(-dy).to_degrees();
    let offset = (angle - start_deg).rem_euclid(360.0);
    if offset <= sweep_deg {
        return (dx.hypot(dy) - radius).abs();
    }

    // Outside the sweep, the nearest point on the arc is one of its ends
    let head = center.polar(radius, start_deg);
    let tail = center.polar(radius, start_deg + sweep_deg);
    (p.x - head.x)
        .hypot(p.y - head.y)
        .min((p.x - tail.x).hypot(p.y - tail.y))
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * abx, a.y + t * aby);
    (p.x - cx).hypot(p.y - cy)
}

/// Blend `color` into every pixel of `bounds` weighted by `coverage`.
fn fill<F>(canvas: &mut RgbaImage, color: Rgba<u8>, bounds: Bounds, coverage: F)
where
    F: Fn(Point) -> f64,
{
    let (w, h) = canvas.dimensions();
    let x0 = bounds.min_x.floor().max(0.0) as u32;
    let y0 = bounds.min_y.floor().max(0.0) as u32;
    let x1 = (bounds.max_x.ceil().max(0.0) as u32).min(w);
    let y1 = (bounds.max_y.ceil().max(0.0) as u32).min(h);

    for y in y0..y1 {
        for x in x0..x1 {
            let cov = coverage(Point::new(x as f64 + 0.5, y as f64 + 0.5));
            if cov > 0.0 {
                blend(canvas.get_pixel_mut(x, y), color, cov);
            }
        }
    }
}

/// Source-over compositing with straight (non-premultiplied) alpha.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f64) {
    let sa = src[3] as f64 / 255.0 * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let s = src[i] as f64;
        let d = dst[i] as f64;
        dst[i] = ((s * sa + d * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
