use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use std::fs;

use crate::config::{LabelPosition, LabelStyle};
use crate::error::{Result, SheetError};
use crate::model::Rect;

/// Label height as a fraction of the cell's smaller side.
pub const LABEL_FRACTION: f32 = 0.05;
/// Smallest label size in pixels.
pub const MIN_LABEL_PX: f32 = 12.0;
/// Distance between a label and the cell edge it is anchored to.
const LABEL_GAP: f32 = 2.0;

/// Font size for labels on a `w`x`h` cell.
pub fn label_font_px(w: u32, h: u32) -> f32 {
    (LABEL_FRACTION * w.min(h) as f32).floor().max(MIN_LABEL_PX)
}

/// Renders item labels with a loaded font.
pub struct LabelRenderer {
    font: FontVec,
    position: LabelPosition,
    color: Option<Rgba<u8>>,
}

impl LabelRenderer {
    pub fn load(style: &LabelStyle) -> Result<Self> {
        let path = style
            .font
            .as_ref()
            .ok_or_else(|| SheetError::Font("no font file configured for labels".into()))?;
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| SheetError::Font(format!("{}: {e}", path.display())))?;
        Ok(Self::from_font(font, style))
    }

    pub fn from_font(font: FontVec, style: &LabelStyle) -> Self {
        Self {
            font,
            position: style.position,
            color: style.color.map(Rgba),
        }
    }

    /// `(width, height)` of `text` at `px`.
    pub fn measure(&self, text: &str, px: f32) -> (f32, f32) {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        (width, scaled.ascent() - scaled.descent())
    }

    /// Top edge of the text box for the configured anchor.
    fn text_top(&self, cell: Rect, text_h: f32) -> f32 {
        let (y, h) = (cell.y as f32, cell.h as f32);
        match self.position {
            LabelPosition::Above => y - text_h - LABEL_GAP,
            LabelPosition::InsideTop => y + LABEL_GAP,
            LabelPosition::InsideMiddle => y + (h - text_h) / 2.0,
            LabelPosition::InsideBottom => y + h - text_h - LABEL_GAP,
            LabelPosition::Below => y + h + LABEL_GAP,
        }
    }

    /// Draws `text` centered horizontally on `cell`; `ink` is used unless a color is configured.
    pub fn draw(&self, canvas: &mut RgbaImage, cell: Rect, text: &str, ink: Rgba<u8>) {
        let px = label_font_px(cell.w, cell.h);
        let scale = PxScale::from(px);
        let scaled = self.font.as_scaled(scale);
        let (text_w, text_h) = self.measure(text, px);
        let color = self.color.unwrap_or(ink);

        let mut caret = cell.x as f32 + (cell.w as f32 - text_w) / 2.0;
        let baseline = self.text_top(cell, text_h) + scaled.ascent();
        let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= cw || y >= ch || coverage <= 0.0 {
                    return;
                }
                let dst = canvas.get_pixel_mut(x as u32, y as u32);
                *dst = blend(*dst, color, coverage.min(1.0));
            });
        }
    }
}

/// Source-over of `src` with `coverage` onto `dst`, alpha included.
fn blend(dst: Rgba<u8>, src: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let a = coverage * src[3] as f32 / 255.0;
    let inv = 1.0 - a;
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round() as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (255.0 * a + dst[3] as f32 * inv).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_is_a_floored_fraction() {
        assert_eq!(label_font_px(1280, 1280), 64.0);
        assert_eq!(label_font_px(1000, 330), 16.0);
        assert_eq!(label_font_px(100, 100), MIN_LABEL_PX);
    }

    #[test]
    fn blend_full_coverage_replaces() {
        let out = blend(Rgba([0, 0, 0, 0]), Rgba([255, 10, 20, 255]), 1.0);
        assert_eq!(out, Rgba([255, 10, 20, 255]));
        let half = blend(Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 255]), 0.5);
        assert_eq!(half, Rgba([128, 128, 128, 255]));
    }
}
