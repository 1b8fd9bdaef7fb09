// Grid coordinates and bounds.

use glam::{IVec2, UVec2, Vec2};

use super::error::GridError;

/// Integer grid coordinate. `x` is the column, `y` the row (top-down).
pub type Cell = UVec2;

/// Width/height of a grid. Every externally derived coordinate is clamped
/// through this before it touches a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Row-major index of `(x, y)`, or `OutOfBounds`.
    pub fn index(&self, x: i64, y: i64) -> Result<usize, GridError> {
        if !self.contains(x, y) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((y as usize) * self.width as usize + x as usize)
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Clamp a signed coordinate into the grid. Bounds must be non-empty.
    pub fn clamp(&self, p: IVec2) -> Cell {
        let max_x = self.width.saturating_sub(1) as i32;
        let max_y = self.height.saturating_sub(1) as i32;
        UVec2::new(p.x.clamp(0, max_x) as u32, p.y.clamp(0, max_y) as u32)
    }

    /// Round half-up to the nearest cell, then clamp.
    pub fn clamp_point(&self, p: Vec2) -> Cell {
        let rounded = (p + Vec2::splat(0.5)).floor();
        self.clamp(IVec2::new(rounded.x as i32, rounded.y as i32))
    }
}

/// Manhattan distance between two cells.
#[inline]
pub fn l1_distance(a: Cell, b: Cell) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_cells_inside() {
        let b = Bounds::new(10, 4);
        assert_eq!(b.clamp(IVec2::new(-3, 2)), UVec2::new(0, 2));
        assert_eq!(b.clamp(IVec2::new(12, 9)), UVec2::new(9, 3));
        assert_eq!(b.clamp_point(Vec2::new(4.5, 1.49)), UVec2::new(5, 1));
    }

    #[test]
    fn index_rejects_out_of_range() {
        let b = Bounds::new(3, 3);
        assert_eq!(b.index(2, 1), Ok(5));
        assert!(matches!(b.index(3, 0), Err(GridError::OutOfBounds { x: 3, .. })));
        assert!(b.index(0, -1).is_err());
    }
}
