use super::{PageGeometry, SizingPolicy};
use crate::config::FillMode;
use crate::geometry::{fit_long_side, fit_within};
use crate::model::{CellSize, PageAssignment, Placement, Rect};

/// Square cells of one shared size, `per_row` per row, as many rows as fit.
///
/// The cell never exceeds the usable height; on wide pages with few cells
/// per row it is limited by the height and each row is centered instead.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    geo: PageGeometry,
    per_row: u32,
    cell: u32,
    rows: u32,
    fill: FillMode,
    height_bound: bool,
}

impl UniformGrid {
    pub fn new(geo: PageGeometry, per_row: u32, fill: FillMode) -> Self {
        let per_row = per_row.max(1);
        let by_width = geo.shared_extent(geo.usable_w, per_row);
        let cell = by_width.min(geo.single_extent(geo.usable_h));
        let rows = geo.count_that_fits(cell, geo.usable_h);
        tracing::debug!(per_row, rows, cell, by_width, "uniform grid");
        Self {
            geo,
            per_row,
            cell,
            rows,
            fill,
            height_bound: cell < by_width,
        }
    }

    pub fn items_per_page(&self) -> usize {
        self.per_row as usize * self.rows as usize
    }

    /// Pixel size an item of `(w, h)` is resized to inside a cell.
    fn resize_target(&self, w: u32, h: u32) -> (u32, u32) {
        let c = self.cell;
        match self.fill {
            FillMode::FitSmaller => fit_within(w, h, c, c, false),
            FillMode::FitLongSide => fit_long_side(w, h, c),
            _ => (c, c),
        }
    }
}

impl SizingPolicy for UniformGrid {
    fn nominal_cell(&self, _sizes: &[(u32, u32)]) -> CellSize {
        CellSize::square(self.cell)
    }

    fn next_page(&self, sizes: &[(u32, u32)], start: usize, page_id: usize) -> PageAssignment {
        let geo = &self.geo;
        let k = self.per_row as usize;
        let end = (start + self.items_per_page()).min(sizes.len());
        let count = end.saturating_sub(start);
        let rows_here = count.div_ceil(k) as u32;

        let y_offset = if geo.start.centers_vertically() {
            geo.centering_offset(geo.usable_h, geo.span(rows_here, self.cell))
        } else {
            0
        };

        let mut placements = Vec::with_capacity(count);
        for (idx, &(w, h)) in sizes[start..end].iter().enumerate() {
            let col = (idx % k) as u32;
            let row = idx / k;
            // Only the last row of the last page can be short; it is centered.
            let row_len = (count - row * k).min(k) as u32;
            let x0 = if row_len < self.per_row || self.height_bound {
                geo.centered_start(geo.usable_w, row_len, self.cell)
            } else {
                geo.origin()
            };
            let x = geo.nth_step(x0, col, self.cell);
            let y = geo.nth_step(geo.origin().saturating_add(y_offset), row as u32, self.cell);
            let target = Rect::new(x, y, self.cell, self.cell);
            let (cw, ch) = self.resize_target(w, h);
            placements.push(Placement {
                item: start + idx,
                target,
                content: target.centered(cw, ch),
            });
        }

        PageAssignment {
            id: page_id,
            width: geo.width,
            height: geo.height,
            placements,
        }
    }
}
