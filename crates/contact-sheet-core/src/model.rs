use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w.saturating_sub(1))
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h.saturating_sub(1))
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn overlaps(&self, r: &Rect) -> bool {
        let end = |a: u32, len: u32| a as u64 + len as u64;
        let (ax2, ay2) = (end(self.x, self.w), end(self.y, self.h));
        let (bx2, by2) = (end(r.x, r.w), end(r.y, r.h));
        let (ax, ay, bx, by) = (self.x as u64, self.y as u64, r.x as u64, r.y as u64);
        !(ax >= bx2 || bx >= ax2 || ay >= by2 || by >= ay2)
    }
    /// A `w`x`h` rectangle centered inside `self` (floored, never left of `self.x`).
    pub fn centered(&self, w: u32, h: u32) -> Rect {
        Rect::new(
            self.x.saturating_add(self.w.saturating_sub(w) / 2),
            self.y.saturating_add(self.h.saturating_sub(h) / 2),
            w,
            h,
        )
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Nominal cell size of a run, printed as `"{w}×{h}"`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellSize {
    pub w: u32,
    pub h: u32,
}

impl CellSize {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
    pub fn square(side: u32) -> Self {
        Self { w: side, h: side }
    }
}

impl fmt::Display for CellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.w, self.h)
    }
}

impl FromStr for CellSize {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s.split_once('×').ok_or(())?;
        Ok(Self {
            w: w.trim().parse().map_err(|_| ())?,
            h: h.trim().parse().map_err(|_| ())?,
        })
    }
}

/// Layout-only input: an item key and its intrinsic pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem<K = String> {
    pub key: K,
    pub w: u32,
    pub h: u32,
}

impl<K> LayoutItem<K> {
    pub fn new(key: K, w: u32, h: u32) -> Self {
        Self { key, w, h }
    }
}

/// One item placed on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Index into the item list the layout was computed from.
    pub item: usize,
    /// The cell reserved for the item on the page.
    pub target: Rect,
    /// Where the resized content lands; its `w,h` is the resize target.
    pub content: Rect,
}

impl Placement {
    /// Pixel size the source is scaled (or cropped and scaled) to before pasting.
    pub fn resize_to(&self) -> (u32, u32) {
        (self.content.w, self.content.h)
    }
}

/// Placements of a single page, in item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAssignment {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl PageAssignment {
    pub fn len(&self) -> usize {
        self.placements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// A fully materialized layout (every page collected).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub page_width: u32,
    pub page_height: u32,
    pub cell: CellSize,
    pub pages: Vec<PageAssignment>,
}

/// Statistics about how much of the pages the items cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutStats {
    pub num_pages: usize,
    pub num_items: usize,
    /// Sum of page areas.
    pub total_page_area: u64,
    /// Sum of content areas (what is actually painted).
    pub used_content_area: u64,
    /// used_content_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
    /// Fullest and emptiest page by item count.
    pub max_items_per_page: usize,
    pub min_items_per_page: usize,
}

impl Layout {
    pub fn num_items(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }

    pub fn stats(&self) -> LayoutStats {
        let num_pages = self.pages.len();
        let mut num_items = 0;
        let mut total_page_area = 0u64;
        let mut used_content_area = 0u64;
        let mut max_items_per_page = 0;
        let mut min_items_per_page = usize::MAX;

        for page in &self.pages {
            total_page_area += page.width as u64 * page.height as u64;
            num_items += page.placements.len();
            max_items_per_page = max_items_per_page.max(page.placements.len());
            min_items_per_page = min_items_per_page.min(page.placements.len());
            for p in &page.placements {
                used_content_area += p.content.area();
            }
        }
        if num_pages == 0 {
            min_items_per_page = 0;
        }

        let occupancy = if total_page_area > 0 {
            used_content_area as f64 / total_page_area as f64
        } else {
            0.0
        };

        LayoutStats {
            num_pages,
            num_items,
            total_page_area,
            used_content_area,
            occupancy,
            max_items_per_page,
            min_items_per_page,
        }
    }
}

impl LayoutStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Items: {}, Occupancy: {:.2}%, Items/page: {}..{}",
            self.num_pages,
            self.num_items,
            self.occupancy * 100.0,
            self.min_items_per_page,
            self.max_items_per_page,
        )
    }
}
