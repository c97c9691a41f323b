use super::{PageGeometry, SizingPolicy};
use crate::geometry::fit_within;
use crate::model::{CellSize, PageAssignment, Placement, Rect};

/// Direction items are stacked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Columns of shared width; items run top to bottom.
    Columns,
    /// Rows of shared height; items run left to right.
    Rows,
}

/// Groups (columns or rows) sharing one dimension, `per_page` groups per page.
///
/// "Main" is the stacking direction inside a group, "cross" the direction
/// groups advance in.
#[derive(Debug, Clone)]
pub struct StackPolicy {
    geo: PageGeometry,
    axis: Axis,
    per_page: u32,
    base: u32,
}

/// One item inside a group: its index and its length along the main axis.
type Member = (usize, u32);

impl StackPolicy {
    pub fn columns(geo: PageGeometry, per_page: u32) -> Self {
        Self::new(geo, Axis::Columns, per_page)
    }

    pub fn rows(geo: PageGeometry, per_page: u32) -> Self {
        Self::new(geo, Axis::Rows, per_page)
    }

    fn new(geo: PageGeometry, axis: Axis, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let mut policy = Self {
            geo,
            axis,
            per_page,
            base: 0,
        };
        policy.base = geo.shared_extent(policy.avail_cross(), per_page);
        tracing::debug!(?axis, per_page, base = policy.base, "stack layout");
        policy
    }

    fn avail_main(&self) -> u32 {
        match self.axis {
            Axis::Columns => self.geo.usable_h,
            Axis::Rows => self.geo.usable_w,
        }
    }

    fn avail_cross(&self) -> u32 {
        match self.axis {
            Axis::Columns => self.geo.usable_w,
            Axis::Rows => self.geo.usable_h,
        }
    }

    /// `(main, cross)` components of an item size.
    fn split(&self, (w, h): (u32, u32)) -> (u64, u64) {
        match self.axis {
            Axis::Columns => (h as u64, w as u64),
            Axis::Rows => (w as u64, h as u64),
        }
    }

    /// Shared dimension for a page starting with `first`.
    ///
    /// With a single group per page it is reverse-solved so that the first
    /// item fits along the main axis.
    fn shared_for(&self, first: (u32, u32)) -> u32 {
        if self.per_page > 1 {
            return self.base;
        }
        let (main, cross) = self.split(first);
        let max_main = self.geo.single_extent(self.avail_main()) as u64;
        let fitted = max_main * cross / main.max(1);
        (self.base as u64).min(fitted).max(1) as u32
    }

    /// Length of an item along the main axis for a shared dimension.
    fn main_len(&self, size: (u32, u32), shared: u32) -> u32 {
        let (main, cross) = self.split(size);
        let len = shared as u64 * main / cross.max(1);
        let max_main = self.geo.single_extent(self.avail_main()) as u64;
        len.clamp(1, max_main) as u32
    }

    fn group_span(&self, group: &[Member]) -> i64 {
        let total: i64 = group.iter().map(|&(_, len)| len as i64).sum();
        self.geo.span_sum(group.len() as u32, total)
    }

    /// Fills up to `per_page` groups starting at `start`.
    fn fill_groups(&self, sizes: &[(u32, u32)], start: usize, shared: u32) -> Vec<Vec<Member>> {
        let avail = self.avail_main() as i64;
        let mut groups: Vec<Vec<Member>> = Vec::new();
        let mut current: Vec<Member> = Vec::new();
        let mut used = 0i64;

        for (idx, &size) in sizes.iter().enumerate().skip(start) {
            let len = self.main_len(size, shared);
            let grown = self
                .geo
                .span_sum(current.len() as u32 + 1, used + len as i64);
            if !current.is_empty() && grown > avail {
                groups.push(std::mem::take(&mut current));
                used = 0;
                if groups.len() as u32 == self.per_page {
                    return groups;
                }
            }
            current.push((idx, len));
            used += len as i64;
        }
        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    fn rect(&self, main: u32, cross: u32, main_len: u32, shared: u32) -> Rect {
        match self.axis {
            Axis::Columns => Rect::new(cross, main, shared, main_len),
            Axis::Rows => Rect::new(main, cross, main_len, shared),
        }
    }
}

impl SizingPolicy for StackPolicy {
    fn nominal_cell(&self, sizes: &[(u32, u32)]) -> CellSize {
        let shared = sizes.first().map_or(self.base, |&s| self.shared_for(s));
        CellSize::square(shared)
    }

    fn next_page(&self, sizes: &[(u32, u32)], start: usize, page_id: usize) -> PageAssignment {
        let geo = &self.geo;
        let mut page = PageAssignment {
            id: page_id,
            width: geo.width,
            height: geo.height,
            placements: Vec::new(),
        };
        let Some(&first) = sizes.get(start) else {
            return page;
        };
        let shared = self.shared_for(first);
        let groups = self.fill_groups(sizes, start, shared);
        let n_groups = groups.len() as u32;
        let consumed: usize = groups.iter().map(Vec::len).sum();
        let only_page = start == 0 && start + consumed == sizes.len();

        // Vertical centering is along the main axis for columns and along
        // the cross axis for rows.
        let centered = geo.start.centers_vertically();
        let main_offset = match self.axis {
            Axis::Columns if centered => {
                let tallest = groups.iter().map(|g| self.group_span(g)).max().unwrap_or(0);
                geo.centering_offset(self.avail_main(), tallest)
            }
            _ => 0,
        };
        let cross_origin = if only_page && n_groups < self.per_page {
            geo.centered_start(self.avail_cross(), n_groups, shared)
        } else if self.axis == Axis::Rows && centered {
            geo.origin()
                .saturating_add(geo.centering_offset(self.avail_cross(), geo.span(n_groups, shared)))
        } else {
            geo.origin()
        };

        for (g, group) in groups.iter().enumerate() {
            let cross = geo.nth_step(cross_origin, g as u32, shared);
            let mut main = geo.origin().saturating_add(main_offset);
            for &(idx, len) in group {
                let target = self.rect(main, cross, len, shared);
                let (w, h) = sizes[idx];
                let (cw, ch) = fit_within(w, h, target.w, target.h, true);
                page.placements.push(Placement {
                    item: idx,
                    target,
                    content: target.centered(cw, ch),
                });
                main = geo.nth_step(main, 1, len);
            }
        }
        page
    }
}
