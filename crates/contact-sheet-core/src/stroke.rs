//! Dash-pattern stroking on RGBA canvases.
//!
//! Lines are drawn by stamping a square pen along the path every half pixel.
//! Rounded corners are always solid; dash patterns apply to straight edges only.

use image::{Rgba, RgbaImage};

use crate::model::Rect;

/// Stroke width and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pen {
    pub width: u32,
    pub color: Rgba<u8>,
}

impl Pen {
    pub fn new(width: u32, color: Rgba<u8>) -> Self {
        Self { width, color }
    }
}

const STEP: f32 = 0.5;

fn stamp(canvas: &mut RgbaImage, x: f32, y: f32, pen: Pen) {
    let w = pen.width.max(1) as i64;
    let off = (w - 1) as f32 / 2.0;
    let left = (x - off).round() as i64;
    let top = (y - off).round() as i64;
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for py in top.max(0)..(top + w).min(ch) {
        for px in left.max(0)..(left + w).min(cw) {
            canvas.put_pixel(px as u32, py as u32, pen.color);
        }
    }
}

/// Draws the part of `p0 -> p1` between distances `from` and `to`.
fn draw_run(canvas: &mut RgbaImage, p0: (f32, f32), dir: (f32, f32), from: f32, to: f32, pen: Pen) {
    let mut t = from;
    while t < to {
        stamp(canvas, p0.0 + dir.0 * t, p0.1 + dir.1 * t, pen);
        t += STEP;
    }
    stamp(canvas, p0.0 + dir.0 * to, p0.1 + dir.1 * to, pen);
}

/// A usable dash pattern: at least one on/off pair, no negative lengths,
/// and a positive total so the walk always advances.
fn usable_pattern(pattern: Option<&[f32]>) -> Option<&[f32]> {
    let p = pattern?;
    let valid = p.len() >= 2
        && p.iter().all(|v| v.is_finite() && *v >= 0.0)
        && p.iter().sum::<f32>() > 0.0;
    valid.then_some(p)
}

/// Strokes the segment `p0 -> p1`, alternating drawn and skipped runs of the
/// lengths in `pattern` (cycled). `None` or a degenerate pattern draws solid.
pub fn trace_dashed_segment(
    canvas: &mut RgbaImage,
    p0: (f32, f32),
    p1: (f32, f32),
    pattern: Option<&[f32]>,
    pen: Pen,
) {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let length = dx.hypot(dy);
    if length <= f32::EPSILON {
        return;
    }
    let dir = (dx / length, dy / length);
    let Some(pattern) = usable_pattern(pattern) else {
        draw_run(canvas, p0, dir, 0.0, length, pen);
        return;
    };
    let mut pos = 0.0f32;
    let mut i = 0usize;
    while pos < length {
        let seg = pattern[i % pattern.len()];
        if i % 2 == 0 && seg > 0.0 {
            draw_run(canvas, p0, dir, pos, (pos + seg).min(length), pen);
        }
        pos += seg;
        i += 1;
    }
}

/// Strokes the outline of `rect` (inclusive edges).
pub fn trace_dashed_rect(canvas: &mut RgbaImage, rect: Rect, pattern: Option<&[f32]>, pen: Pen) {
    let (x1, y1) = (rect.x as f32, rect.y as f32);
    let (x2, y2) = (rect.right() as f32, rect.bottom() as f32);
    trace_dashed_segment(canvas, (x1, y1), (x2, y1), pattern, pen);
    trace_dashed_segment(canvas, (x2, y1), (x2, y2), pattern, pen);
    trace_dashed_segment(canvas, (x2, y2), (x1, y2), pattern, pen);
    trace_dashed_segment(canvas, (x1, y2), (x1, y1), pattern, pen);
}

/// Solid arc around `center`, angles in degrees, clockwise from 3 o'clock
/// (y grows downwards).
pub fn trace_arc(
    canvas: &mut RgbaImage,
    center: (f32, f32),
    radius: f32,
    start_deg: f32,
    end_deg: f32,
    pen: Pen,
) {
    if radius <= 0.0 {
        stamp(canvas, center.0, center.1, pen);
        return;
    }
    let sweep = (end_deg - start_deg).to_radians();
    let steps = ((radius * sweep.abs()) / STEP).ceil().max(1.0) as u32;
    let start = start_deg.to_radians();
    for s in 0..=steps {
        let a = start + sweep * s as f32 / steps as f32;
        stamp(canvas, center.0 + radius * a.cos(), center.1 + radius * a.sin(), pen);
    }
}

/// Clamps a corner radius to half of the shorter side of `rect`.
pub fn clamp_radius(rect: Rect, radius: u32) -> u32 {
    let max_w = rect.right().saturating_sub(rect.x) / 2;
    let max_h = rect.bottom().saturating_sub(rect.y) / 2;
    radius.min(max_w).min(max_h)
}

/// Strokes a rounded rectangle: solid corner arcs, dashed straight edges.
pub fn trace_dashed_rounded_rect(
    canvas: &mut RgbaImage,
    rect: Rect,
    radius: u32,
    pattern: Option<&[f32]>,
    pen: Pen,
) {
    let r = clamp_radius(rect, radius) as f32;
    let (x1, y1) = (rect.x as f32, rect.y as f32);
    let (x2, y2) = (rect.right() as f32, rect.bottom() as f32);

    trace_arc(canvas, (x1 + r, y1 + r), r, 180.0, 270.0, pen);
    trace_arc(canvas, (x2 - r, y1 + r), r, 270.0, 360.0, pen);
    trace_arc(canvas, (x2 - r, y2 - r), r, 0.0, 90.0, pen);
    trace_arc(canvas, (x1 + r, y2 - r), r, 90.0, 180.0, pen);

    trace_dashed_segment(canvas, (x1 + r, y1), (x2 - r, y1), pattern, pen);
    trace_dashed_segment(canvas, (x2, y1 + r), (x2, y2 - r), pattern, pen);
    trace_dashed_segment(canvas, (x2 - r, y2), (x1 + r, y2), pattern, pen);
    trace_dashed_segment(canvas, (x1, y2 - r), (x1, y1 + r), pattern, pen);
}
