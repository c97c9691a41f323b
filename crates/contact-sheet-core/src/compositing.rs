use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{Background, BorderShape, BorderStyle, FillMode, LayoutConfig};
use crate::error::{Result, SheetError};
use crate::geometry::center_crop_square;
use crate::label::LabelRenderer;
use crate::model::{PageAssignment, Placement, Rect};
use crate::sink::OutputSink;
use crate::source::{ImageSource, Item};
use crate::stroke::{Pen, trace_dashed_rect, trace_dashed_rounded_rect};

/// Stroke width of per-item borders.
pub const ITEM_BORDER_WIDTH: u32 = 2;
/// Stroke width of the page border.
pub const PAGE_BORDER_WIDTH: u32 = 4;

/// Allocates a `w`x`h` canvas filled with the background color.
pub fn new_canvas(w: u32, h: u32, background: Background) -> Result<RgbaImage> {
    let bytes = (w as u64) * (h as u64) * 4;
    if w == 0 || h == 0 || bytes > isize::MAX as u64 {
        return Err(SheetError::CanvasAllocation {
            width: w,
            height: h,
        });
    }
    Ok(RgbaImage::from_pixel(w, h, background.fill()))
}

/// Maps a decoded source to its resize target: crop first for `CropSquare`,
/// then scale to exactly `(w, h)`. Output is fully opaque.
pub fn render_content(src: &DynamicImage, fill: FillMode, w: u32, h: u32) -> RgbaImage {
    let rgb = DynamicImage::ImageRgb8(src.to_rgb8());
    let rgb = if fill == FillMode::CropSquare {
        center_crop_square(&rgb)
    } else {
        rgb
    };
    if rgb.width() == w && rgb.height() == h {
        return rgb.to_rgba8();
    }
    rgb.resize_exact(w, h, FilterType::Lanczos3).to_rgba8()
}

/// Copy `src` into `canvas` with its top-left at `(dx, dy)`, clipped to the canvas.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    for (x, y, px) in src.enumerate_pixels() {
        let (Some(cx), Some(cy)) = (dx.checked_add(x), dy.checked_add(y)) else {
            continue;
        };
        if cx < cw && cy < ch {
            canvas.put_pixel(cx, cy, *px);
        }
    }
}

/// Strokes `rect` with a border style; no-op for `BorderShape::None`.
pub fn stroke_border(canvas: &mut RgbaImage, rect: Rect, style: &BorderStyle, pen: Pen) {
    let pattern = style.line.pattern();
    match style.shape {
        BorderShape::None => {}
        BorderShape::Rectangle => trace_dashed_rect(canvas, rect, pattern, pen),
        BorderShape::Rounded(r) => trace_dashed_rounded_rect(canvas, rect, r, pattern, pen),
    }
}

/// Converts a finished canvas into a normalized float raster:
/// RGB for opaque backgrounds, RGBA for transparent ones.
pub fn to_normalized(canvas: RgbaImage, background: Background) -> DynamicImage {
    let img = DynamicImage::ImageRgba8(canvas);
    if background.has_alpha() {
        DynamicImage::ImageRgba32F(img.to_rgba32f())
    } else {
        DynamicImage::ImageRgb32F(img.to_rgb32f())
    }
}

/// Path of a per-item export: `<dir>/page_<p>/block_<p>_<i>_<stem>.png` (1-based).
pub fn item_export_path(dir: &Path, page_id: usize, index_in_page: usize, stem: &str) -> PathBuf {
    let p = page_id + 1;
    dir.join(format!("page_{p}"))
        .join(format!("block_{p}_{}_{stem}.png", index_in_page + 1))
}

/// Renders pages of a layout onto canvases.
pub struct PageCompositor<'a> {
    cfg: &'a LayoutConfig,
    labels: Option<LabelRenderer>,
}

impl<'a> PageCompositor<'a> {
    /// Loads the label font when labels are configured. A missing or broken
    /// font disables labels with a warning.
    pub fn new(cfg: &'a LayoutConfig) -> Self {
        let labels = cfg.label.as_ref().and_then(|style| match LabelRenderer::load(style) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(error = %e, "labels disabled");
                None
            }
        });
        Self { cfg, labels }
    }

    fn ink(&self) -> Pen {
        Pen::new(ITEM_BORDER_WIDTH, self.cfg.background.ink())
    }

    /// Draws one page. Items that fail to decode are skipped and their cell
    /// stays background; a failing export aborts the page.
    pub fn compose_page(
        &self,
        page: &PageAssignment,
        items: &[Item],
        source: &dyn ImageSource,
        mut export: Option<&mut dyn OutputSink>,
    ) -> Result<RgbaImage> {
        let bg = self.cfg.background;
        let mut canvas = new_canvas(page.width, page.height, bg)?;

        for (idx, placement) in page.placements.iter().enumerate() {
            let Some(item) = items.get(placement.item) else {
                warn!(item = placement.item, "placement refers to an unknown item");
                continue;
            };
            let decoded = match source.decode(item) {
                Ok(img) => img,
                Err(e) => {
                    warn!(page = page.id + 1, key = %item.key, error = %e, "skip item");
                    continue;
                }
            };
            let (w, h) = placement.resize_to();
            let content = render_content(&decoded, self.cfg.fill, w, h);

            let sink = export.as_mut().map(|s| &mut **s as &mut dyn OutputSink);
            if let (Some(sink), Some(dir)) = (sink, &self.cfg.export_dir) {
                let path = item_export_path(dir, page.id, idx, item.stem());
                self.export_item(&content, placement, sink, &path)?;
                debug!(path = %path.display(), "item exported");
            }

            blit_rgba(&content, &mut canvas, placement.content.x, placement.content.y);
            stroke_border(&mut canvas, placement.target, &self.cfg.item_border, self.ink());
            if let Some(labels) = &self.labels {
                labels.draw(&mut canvas, placement.target, item.stem(), bg.ink());
            }
        }

        if self.cfg.page_border.is_visible() {
            let m = self.cfg.margin;
            let inner = Rect::new(
                m,
                m,
                page.width.saturating_sub(m.saturating_mul(2)).max(1),
                page.height.saturating_sub(m.saturating_mul(2)).max(1),
            );
            let pen = Pen::new(PAGE_BORDER_WIDTH, bg.ink());
            stroke_border(&mut canvas, inner, &self.cfg.page_border, pen);
        }
        debug!(page = page.id + 1, items = page.placements.len(), "page composed");
        Ok(canvas)
    }

    /// A standalone raster of one item: target-sized canvas, content centered,
    /// item border along the canvas edge.
    pub fn render_item(&self, content: &RgbaImage, placement: &Placement) -> Result<RgbaImage> {
        let t = placement.target;
        let mut block = new_canvas(t.w, t.h, self.cfg.background)?;
        blit_rgba(
            content,
            &mut block,
            placement.content.x.saturating_sub(t.x),
            placement.content.y.saturating_sub(t.y),
        );
        stroke_border(
            &mut block,
            Rect::new(0, 0, t.w, t.h),
            &self.cfg.item_border,
            self.ink(),
        );
        Ok(block)
    }

    fn export_item(
        &self,
        content: &RgbaImage,
        placement: &Placement,
        sink: &mut dyn OutputSink,
        path: &Path,
    ) -> Result<()> {
        let block = self.render_item(content, placement)?;
        let img = if self.cfg.background.has_alpha() {
            DynamicImage::ImageRgba8(block)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(block).to_rgb8())
        };
        sink.write(&img, path)
    }
}
