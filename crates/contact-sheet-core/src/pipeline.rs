use image::DynamicImage;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::compositing::{PageCompositor, to_normalized};
use crate::config::LayoutConfig;
use crate::error::{Result, SheetError};
use crate::model::{CellSize, Layout, LayoutItem};
use crate::packer::{LayoutPlan, pack_layout};
use crate::sink::OutputSink;
use crate::source::{ImageSource, Item};

/// Side of the square placeholder raster returned for soft failures.
pub const PLACEHOLDER_SIDE: u32 = 100;

/// Why a run produced a placeholder instead of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// The source directory does not exist (red placeholder).
    MissingDirectory,
    /// Nothing eligible to lay out (yellow placeholder).
    NoImages,
}

impl Placeholder {
    pub fn color(self) -> [f32; 3] {
        match self {
            Placeholder::MissingDirectory => [1.0, 0.0, 0.0],
            Placeholder::NoImages => [1.0, 1.0, 0.0],
        }
    }
}

/// Page rasters of one run stacked into a single buffer
/// (`pages × height × width × channels`, values in `[0, 1]`).
#[derive(Debug, Clone, PartialEq)]
pub struct PageBatch {
    pub width: u32,
    pub height: u32,
    /// 3 for opaque backgrounds, 4 for transparent ones.
    pub channels: u8,
    pub data: Vec<f32>,
}

impl PageBatch {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
            data: Vec::new(),
        }
    }

    /// A one-page batch filled with the placeholder color.
    pub fn placeholder(reason: Placeholder) -> Self {
        let side = PLACEHOLDER_SIDE;
        let data = reason
            .color()
            .iter()
            .copied()
            .cycle()
            .take((side * side * 3) as usize)
            .collect();
        Self {
            width: side,
            height: side,
            channels: 3,
            data,
        }
    }

    fn page_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.page_len().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a page; it must match the batch dimensions and channel count.
    pub fn push(&mut self, page: DynamicImage) -> Result<()> {
        if page.width() != self.width || page.height() != self.height {
            return Err(SheetError::InvalidInput(format!(
                "page is {}x{}, batch expects {}x{}",
                page.width(),
                page.height(),
                self.width,
                self.height
            )));
        }
        let raw = if self.channels == 4 {
            page.into_rgba32f().into_raw()
        } else {
            page.into_rgb32f().into_raw()
        };
        self.data.extend_from_slice(&raw);
        Ok(())
    }

    pub fn page(&self, index: usize) -> Option<&[f32]> {
        let len = self.page_len();
        self.data.get(index * len..(index + 1) * len)
    }

    /// Page `index` as an image (float channels).
    pub fn to_image(&self, index: usize) -> Option<DynamicImage> {
        let raw = self.page(index)?.to_vec();
        if self.channels == 4 {
            image::Rgba32FImage::from_raw(self.width, self.height, raw)
                .map(DynamicImage::ImageRgba32F)
        } else {
            image::Rgb32FImage::from_raw(self.width, self.height, raw)
                .map(DynamicImage::ImageRgb32F)
        }
    }
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct SheetOutput {
    pub pages: PageBatch,
    pub page_count: usize,
    /// Nominal cell size used to size items.
    pub cell: CellSize,
    /// Eligible items found by the source.
    pub item_count: usize,
    /// Items dropped because their size could not be read.
    pub skipped: usize,
    /// Where per-item rasters were written, when enabled.
    pub export_dir: Option<PathBuf>,
    pub placeholder: Option<Placeholder>,
}

impl SheetOutput {
    fn placeholder(reason: Placeholder, export_dir: Option<PathBuf>) -> Self {
        Self {
            pages: PageBatch::placeholder(reason),
            page_count: 0,
            cell: CellSize::default(),
            item_count: 0,
            skipped: 0,
            export_dir,
            placeholder: Some(reason),
        }
    }

    /// Nominal cell size as `"{w}×{h}"`.
    pub fn cell_size(&self) -> String {
        self.cell.to_string()
    }
}

/// Items that could be probed, in source order, with their sizes.
pub struct ProbedItems {
    pub items: Vec<Item>,
    pub sizes: Vec<LayoutItem<String>>,
    /// Items the source listed.
    pub listed: usize,
    pub skipped: usize,
}

/// Lists and probes every item. Missing directories propagate as
/// `SheetError::MissingDirectory`; unreadable items are dropped with a warning.
pub fn probe_items(source: &dyn ImageSource) -> Result<ProbedItems> {
    let listed = source.list()?;
    let total = listed.len();
    let mut items = Vec::with_capacity(total);
    let mut sizes = Vec::with_capacity(total);
    for item in listed {
        match source.probe_size(&item) {
            Ok((w, h)) => {
                sizes.push(LayoutItem::new(item.key.clone(), w, h));
                items.push(item);
            }
            Err(e) => warn!(key = %item.key, error = %e, "skip unreadable item"),
        }
    }
    info!(listed = total, usable = items.len(), "items probed");
    Ok(ProbedItems {
        skipped: total - items.len(),
        listed: total,
        items,
        sizes,
    })
}

/// Computes the layout only (no decoding beyond headers).
#[instrument(skip_all)]
pub fn layout_source(source: &dyn ImageSource, cfg: &LayoutConfig) -> Result<(Layout, ProbedItems)> {
    let probed = probe_items(source)?;
    let layout = pack_layout(&probed.sizes, cfg)?;
    Ok((layout, probed))
}

/// Lays out every item of `source` and renders all pages.
///
/// Soft failures (missing directory, no usable images) return a flagged
/// placeholder output; only invalid configuration, canvas allocation and
/// sink I/O are errors. Per-item exports go to `sink` when `export_dir` is set.
pub fn compose_sheets(
    source: &dyn ImageSource,
    cfg: &LayoutConfig,
    sink: Option<&mut dyn OutputSink>,
) -> Result<SheetOutput> {
    compose_sheets_with_progress(source, cfg, sink, &mut |_, _| {})
}

/// As [`compose_sheets`], calling `on_page(done, total)` after each page.
#[instrument(skip_all, fields(fill = ?cfg.fill, per_row = cfg.per_row))]
pub fn compose_sheets_with_progress(
    source: &dyn ImageSource,
    cfg: &LayoutConfig,
    mut sink: Option<&mut dyn OutputSink>,
    on_page: &mut dyn FnMut(usize, usize),
) -> Result<SheetOutput> {
    cfg.validate()?;

    let probed = match probe_items(source) {
        Ok(p) => p,
        Err(SheetError::MissingDirectory(dir)) => {
            warn!(dir = %dir.display(), "source directory does not exist");
            return Ok(SheetOutput::placeholder(
                Placeholder::MissingDirectory,
                cfg.export_dir.clone(),
            ));
        }
        Err(e) => return Err(e),
    };
    if probed.items.is_empty() {
        warn!(listed = probed.listed, "no usable images");
        let mut out = SheetOutput::placeholder(Placeholder::NoImages, cfg.export_dir.clone());
        out.item_count = probed.listed;
        out.skipped = probed.skipped;
        return Ok(out);
    }
    if cfg.export_dir.is_some() && sink.is_none() {
        warn!("export_dir is set but no sink was given; items are not exported");
    }

    let plan = LayoutPlan::new(&probed.sizes, cfg);
    let total = plan.page_count();
    let geo = *plan.geometry();
    info!(
        pages = total,
        cell = %plan.cell(),
        page_w = geo.width,
        page_h = geo.height,
        "layout planned"
    );

    let compositor = PageCompositor::new(cfg);
    let mut batch = PageBatch::new(geo.width, geo.height, cfg.background.channels());
    for page in plan.pages() {
        let export = sink.as_mut().map(|s| &mut **s as &mut dyn OutputSink);
        let canvas = compositor.compose_page(&page, &probed.items, source, export)?;
        batch.push(to_normalized(canvas, cfg.background))?;
        on_page(page.id + 1, total);
    }

    Ok(SheetOutput {
        pages: batch,
        page_count: total,
        cell: plan.cell(),
        item_count: probed.listed,
        skipped: probed.skipped,
        export_dir: cfg.export_dir.clone(),
        placeholder: None,
    })
}
