use image::DynamicImage;
use tracing::warn;

/// Ratio used when the configured aspect ratio cannot be parsed.
pub const DEFAULT_ASPECT_RATIO: f64 = 1.5;

/// Smallest usable page extent (pixels) after margins are removed.
pub const MIN_USABLE_EXTENT: u32 = 20;

/// Parses a `"W:H"` ratio into `W / H`.
///
/// Malformed input never errors: it logs a warning and yields
/// [`DEFAULT_ASPECT_RATIO`].
pub fn parse_aspect_ratio(text: &str) -> f64 {
    let parsed = text.split_once(':').and_then(|(w, h)| {
        let w: f64 = w.trim().parse().ok()?;
        let h: f64 = h.trim().parse().ok()?;
        let ratio = w / h;
        (w > 0.0 && h > 0.0 && ratio.is_finite()).then_some(ratio)
    });
    match parsed {
        Some(r) => r,
        None => {
            warn!(ratio = text, fallback = DEFAULT_ASPECT_RATIO, "invalid aspect ratio");
            DEFAULT_ASPECT_RATIO
        }
    }
}

/// Page height derived from a width and ratio text.
///
/// The ratio is rounded to two decimals first, so `"16:9"` behaves as 1.78.
pub fn page_height_for(width: u32, ratio_text: &str) -> u32 {
    let ratio = (parse_aspect_ratio(ratio_text) * 100.0).round() / 100.0;
    let ratio = if ratio > 0.0 { ratio } else { DEFAULT_ASPECT_RATIO };
    ((width as f64 / ratio) as u32).max(1)
}

/// Crops the longer dimension symmetrically so the result is a square with
/// the shorter side.
pub fn center_crop_square(img: &DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let side = w.min(h);
    img.crop_imm((w - side) / 2, (h - side) / 2, side, side)
}

/// Largest size with the aspect of `(w, h)` that fits in `(max_w, max_h)`.
///
/// With `allow_upscale == false` sources that already fit keep their size.
pub fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32, allow_upscale: bool) -> (u32, u32) {
    if w == 0 || h == 0 {
        return (max_w.max(1), max_h.max(1));
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    if scale >= 1.0 && !allow_upscale {
        return (w, h);
    }
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (nw, nh)
}

/// Scales `(w, h)` so its long side equals `target` (up or down), then keeps
/// it inside a `target` square.
pub fn fit_long_side(w: u32, h: u32, target: u32) -> (u32, u32) {
    let long = w.max(h);
    if long == 0 {
        return (target.max(1), target.max(1));
    }
    if long < target {
        let scale = target as f64 / long as f64;
        let nw = ((w as f64 * scale) as u32).clamp(1, target);
        let nh = ((h as f64 * scale) as u32).clamp(1, target);
        (nw, nh)
    } else {
        fit_within(w, h, target, target, false)
    }
}
