use crate::config::{FillMode, LayoutConfig, StartPosition};
use crate::error::{Result, SheetError};
use crate::geometry::MIN_USABLE_EXTENT;
use crate::model::{CellSize, Layout, LayoutItem, PageAssignment};

pub mod grid;
pub mod stack;

use grid::UniformGrid;
use stack::StackPolicy;

/// A sizing policy turns item sizes into pages, one page per call.
///
/// `next_page` must place at least one item whenever `start < sizes.len()`,
/// and must place items in order starting at `start`.
pub trait SizingPolicy {
    /// Nominal cell size reported for the run.
    fn nominal_cell(&self, sizes: &[(u32, u32)]) -> CellSize;
    /// Packs the page `page_id` beginning with item `start`.
    fn next_page(&self, sizes: &[(u32, u32)], start: usize, page_id: usize) -> PageAssignment;
}

/// Page dimensions and the spacing rules shared by every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub padding: u32,
    pub start: StartPosition,
    pub usable_w: u32,
    pub usable_h: u32,
}

impl PageGeometry {
    pub fn new(cfg: &LayoutConfig) -> Self {
        let (width, height) = cfg.page_size();
        let usable = |extent: u32| {
            (extent as i64 - 2 * cfg.margin as i64).max(MIN_USABLE_EXTENT as i64) as u32
        };
        Self {
            width,
            height,
            margin: cfg.margin,
            padding: cfg.padding,
            start: cfg.start,
            usable_w: usable(width),
            usable_h: usable(height),
        }
    }

    /// Offset of the first cell from the page edge.
    pub fn origin(&self) -> u32 {
        self.margin.saturating_add(self.start.lead(self.padding))
    }

    /// Extent taken by `n` items whose sizes add up to `total`, gaps included.
    pub fn span_sum(&self, n: u32, total: i64) -> i64 {
        if n == 0 {
            return 0;
        }
        total.saturating_add(self.gap_total(n))
    }

    /// Total padding between and around `n` items.
    fn gap_total(&self, n: u32) -> i64 {
        self.start.gaps(n).saturating_mul(self.padding as i64)
    }

    /// Extent taken by `n` items of size `size`, gaps included.
    pub fn span(&self, n: u32, size: u32) -> i64 {
        self.span_sum(n, (n as i64).saturating_mul(size as i64))
    }

    /// Size shared by `k` items filling `avail` (truncated, at least 1).
    pub fn shared_extent(&self, avail: u32, k: u32) -> u32 {
        let k = k.max(1) as i64;
        ((avail as i64 - self.gap_total(k as u32)) / k).max(1) as u32
    }

    /// Largest count `r >= 1` with `span(r, size) <= avail`.
    pub fn count_that_fits(&self, size: u32, avail: u32) -> u32 {
        let step = size as i64 + self.padding as i64;
        let room = avail as i64 - self.gap_total(0);
        (room / step.max(1)).clamp(1, u32::MAX as i64) as u32
    }

    /// Extent a single item may take along an axis of length `avail`.
    pub fn single_extent(&self, avail: u32) -> u32 {
        (avail as i64 - self.gap_total(1)).max(1) as u32
    }

    /// Position of the `n`th cell of pitch `size + padding` after `first`.
    /// Saturates instead of overflowing for oversized margins or padding.
    pub fn nth_step(&self, first: u32, n: u32, size: u32) -> u32 {
        let step = size.saturating_add(self.padding);
        first.saturating_add(n.saturating_mul(step))
    }

    /// Offset that centers `occupied` inside `avail` (never negative).
    pub fn centering_offset(&self, avail: u32, occupied: i64) -> u32 {
        ((avail as i64 - occupied) / 2).max(0) as u32
    }

    /// Position of the first of `n` items of size `size` centered inside the
    /// usable extent `avail`; outer gaps are not part of the centered block.
    pub fn centered_start(&self, avail: u32, n: u32, size: u32) -> u32 {
        let visible = (n as i64)
            .saturating_mul(size as i64)
            .saturating_add((n as i64 - 1).max(0).saturating_mul(self.padding as i64));
        self.margin.saturating_add(self.centering_offset(avail, visible))
    }
}

/// Selects the policy for a fill mode.
pub fn policy_for(cfg: &LayoutConfig) -> Box<dyn SizingPolicy> {
    let geo = PageGeometry::new(cfg);
    let k = cfg.per_row.max(1);
    match cfg.fill {
        FillMode::EqualWidthStack => Box::new(StackPolicy::columns(geo, k)),
        FillMode::EqualHeightStack => Box::new(StackPolicy::rows(geo, k)),
        fill => Box::new(UniformGrid::new(geo, k, fill)),
    }
}

/// A computed layout that yields its pages lazily, one at a time.
pub struct LayoutPlan {
    geometry: PageGeometry,
    sizes: Vec<(u32, u32)>,
    policy: Box<dyn SizingPolicy>,
}

impl LayoutPlan {
    pub fn new<K>(items: &[LayoutItem<K>], cfg: &LayoutConfig) -> Self {
        let sizes = items.iter().map(|it| (it.w.max(1), it.h.max(1))).collect();
        Self {
            geometry: PageGeometry::new(cfg),
            sizes,
            policy: policy_for(cfg),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn num_items(&self) -> usize {
        self.sizes.len()
    }

    /// Nominal cell size of the run (`0×0` when there are no items).
    pub fn cell(&self) -> CellSize {
        if self.sizes.is_empty() {
            return CellSize::default();
        }
        self.policy.nominal_cell(&self.sizes)
    }

    pub fn pages(&self) -> Pages<'_> {
        Pages {
            plan: self,
            next: 0,
            page_id: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages().count()
    }
}

/// Iterator over the pages of a [`LayoutPlan`].
pub struct Pages<'a> {
    plan: &'a LayoutPlan,
    next: usize,
    page_id: usize,
}

impl Iterator for Pages<'_> {
    type Item = PageAssignment;

    fn next(&mut self) -> Option<PageAssignment> {
        if self.next >= self.plan.sizes.len() {
            return None;
        }
        let page = self
            .plan
            .policy
            .next_page(&self.plan.sizes, self.next, self.page_id);
        // A policy that places nothing would loop forever; treat it as exhausted.
        if page.placements.is_empty() {
            self.next = self.plan.sizes.len();
            return None;
        }
        self.next += page.placements.len();
        self.page_id += 1;
        Some(page)
    }
}

/// Packs layout-only items into pages without touching pixel data.
pub fn pack_layout<K>(items: &[LayoutItem<K>], cfg: &LayoutConfig) -> Result<Layout> {
    cfg.validate()?;
    if items.is_empty() {
        return Err(SheetError::Empty);
    }
    let plan = LayoutPlan::new(items, cfg);
    let pages: Vec<PageAssignment> = plan.pages().collect();
    tracing::debug!(
        pages = pages.len(),
        items = items.len(),
        cell = %plan.cell(),
        "layout computed"
    );
    Ok(Layout {
        page_width: plan.geometry.width,
        page_height: plan.geometry.height,
        cell: plan.cell(),
        pages,
    })
}
