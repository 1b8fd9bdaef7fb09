// Static obstacle layer.
//
// ObstacleMask: raw per-cell "visually obstructed" flags handed over by the
//               mask source (maze rasterizer, tile editor, tests).
// ObstacleField: the mask dilated by the agents' physical radius, built once
//               per session and read-only afterwards. Agents are treated as
//               points against this field.

use glam::IVec2;

use super::cell::{Bounds, Cell};
use super::error::GridError;

// ============================================================================
// OBSTACLE MASK
// ============================================================================

/// Row-major boolean grid, `true` = obstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMask {
    cells: Vec<bool>,
    bounds: Bounds,
}

impl ObstacleMask {
    /// All-free mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![false; width as usize * height as usize],
            bounds: Bounds::new(width, height),
        }
    }

    /// Build from `rows[y][x]`. All rows must have the same, non-zero length.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(GridError::ShapeMismatch("mask must not be empty".into()));
        }
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GridError::ShapeMismatch(format!(
                "row {} has {} cells, expected {}",
                y,
                row.len(),
                width
            )));
        }
        Ok(Self {
            cells: rows.iter().flatten().copied().collect(),
            bounds: Bounds::new(width as u32, height as u32),
        })
    }

    /// Build from row-major `cells`; the length must equal `width * height`
    /// and the grid must not be empty.
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Result<Self, GridError> {
        let bounds = Bounds::new(width, height);
        if bounds.area() == 0 {
            return Err(GridError::ShapeMismatch("mask must not be empty".into()));
        }
        if cells.len() != bounds.area() {
            return Err(GridError::ShapeMismatch(format!(
                "{} cells for a {}x{} mask",
                cells.len(),
                width,
                height
            )));
        }
        Ok(Self { cells, bounds })
    }

    /// Parse an ASCII picture: `#` is obstructed, anything else is free.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, GridError> {
        let rows: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| r.chars().map(|c| c == '#').collect())
            .collect();
        Self::from_rows(&rows)
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn get(&self, x: i64, y: i64) -> Result<bool, GridError> {
        Ok(self.cells[self.bounds.index(x, y)?])
    }

    pub fn set(&mut self, x: i64, y: i64, value: bool) -> Result<(), GridError> {
        let idx = self.bounds.index(x, y)?;
        self.cells[idx] = value;
        Ok(())
    }

    /// Set every cell in `[x0, x1) x [y0, y1)` to `value`, clipped to the grid.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, value: bool) {
        let w = self.bounds.width as i64;
        let h = self.bounds.height as i64;
        for y in y0.max(0)..y1.min(h) {
            let row = (y * w) as usize;
            for x in x0.max(0)..x1.min(w) {
                self.cells[row + x as usize] = value;
            }
        }
    }

    /// Iterate obstructed cells in row-major order.
    pub fn obstructed(&self) -> impl Iterator<Item = Cell> + '_ {
        let w = self.bounds.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| Cell::new((i % w) as u32, (i / w) as u32))
    }
}

// ============================================================================
// OBSTACLE FIELD
// ============================================================================

/// Inflated obstacle grid. Immutable once built; share it by reference.
#[derive(Debug, Clone)]
pub struct ObstacleField {
    blocked: Vec<bool>,
    bounds: Bounds,
    inflate_radius: u32,
}

impl ObstacleField {
    /// Fully open field. Used by tests and as the empty-editor default.
    pub fn new_open(width: u32, height: u32) -> Self {
        Self {
            blocked: vec![false; width as usize * height as usize],
            bounds: Bounds::new(width, height),
            inflate_radius: 0,
        }
    }

    /// Dilate `mask` with a Euclidean disc of radius `inflate_radius`: a cell
    /// is blocked when some obstructed mask cell lies within that distance.
    pub fn build(mask: &ObstacleMask, inflate_radius: u32) -> Self {
        let bounds = mask.bounds();
        let mut blocked = vec![false; bounds.area()];
        // past width + height every cell is already covered
        let reach = inflate_radius
            .min(bounds.width.saturating_add(bounds.height))
            .min(i32::MAX as u32);
        let disc = disc_offsets(reach);

        for src in mask.obstructed() {
            let origin = IVec2::new(src.x as i32, src.y as i32);
            for off in &disc {
                let p = origin + *off;
                if let Ok(idx) = bounds.index(p.x as i64, p.y as i64) {
                    blocked[idx] = true;
                }
            }
        }

        let field = Self {
            blocked,
            bounds,
            inflate_radius,
        };
        log::debug!(
            "obstacle field {}x{} r={}: {} blocked cells",
            bounds.width,
            bounds.height,
            inflate_radius,
            field.blocked_count()
        );
        field
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bounds.height
    }

    pub fn inflate_radius(&self) -> u32 {
        self.inflate_radius
    }

    /// O(1) lookup. Fails with `OutOfBounds` outside the grid; callers clamp.
    pub fn blocked(&self, x: i64, y: i64) -> Result<bool, GridError> {
        Ok(self.blocked[self.bounds.index(x, y)?])
    }

    /// True if `cell` is inside the grid and not blocked.
    #[inline]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.blocked(cell.x as i64, cell.y as i64) == Ok(false)
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }
}

/// All integer offsets with `dx² + dy² <= r²`.
fn disc_offsets(radius: u32) -> Vec<IVec2> {
    let r = radius as i64;
    let r_sq = r * r;
    let mut out = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r_sq {
                out.push(IVec2::new(dx as i32, dy as i32));
            }
        }
    }
    out
}
