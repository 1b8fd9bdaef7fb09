// Nearest-free-cell fallback for targets that land inside obstacles.
//
// Searches a fixed square window around the candidate only. A target deep
// inside a wall comes back unchanged and the planner will simply fail to
// reach it.

use glam::IVec2;

use super::cell::Cell;
use super::obstacle::ObstacleField;

/// Half-width of the search window, in cells.
pub const DEFAULT_SEARCH_HALF_WIDTH: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct FreeCellResolver {
    half_width: u32,
}

impl Default for FreeCellResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_HALF_WIDTH)
    }
}

impl FreeCellResolver {
    pub fn new(half_width: u32) -> Self {
        Self { half_width }
    }

    pub fn half_width(&self) -> u32 {
        self.half_width
    }

    /// Return `cell` if it is free, otherwise the closest free cell (squared
    /// Euclidean distance) in the window, otherwise `cell` unchanged.
    ///
    /// Offsets are scanned x-outer, y-inner from `-R` to `R`, each clamped to
    /// the grid; a candidate only replaces the current best when strictly
    /// closer, so the first cell found wins ties. `cell` must be in bounds.
    pub fn resolve(&self, cell: Cell, field: &ObstacleField) -> Cell {
        if field.is_walkable(cell) {
            return cell;
        }

        let bounds = field.bounds();
        let origin = IVec2::new(cell.x as i32, cell.y as i32);
        let r = self.half_width as i32;
        let mut best = cell;
        let mut best_dist = i32::MAX;

        for ox in -r..=r {
            for oy in -r..=r {
                let candidate = bounds.clamp(origin + IVec2::new(ox, oy));
                let d = IVec2::new(candidate.x as i32, candidate.y as i32) - origin;
                let dist = d.length_squared();
                if dist < best_dist && field.is_walkable(candidate) {
                    best = candidate;
                    best_dist = dist;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::obstacle::ObstacleMask;

    fn field(rows: &[&str]) -> ObstacleField {
        ObstacleField::build(&ObstacleMask::from_ascii(rows).unwrap(), 0)
    }

    #[test]
    fn free_cell_is_returned_unchanged() {
        let f = ObstacleField::new_open(8, 8);
        let r = FreeCellResolver::default();
        assert_eq!(r.resolve(Cell::new(3, 4), &f), Cell::new(3, 4));
    }

    #[test]
    fn nearest_neighbor_in_scan_order() {
        let mut mask = ObstacleMask::new(10, 10);
        mask.set(5, 5, true).unwrap();
        let f = ObstacleField::build(&mask, 0);
        // all four neighbours are free; (-1, 0) is scanned first
        assert_eq!(FreeCellResolver::default().resolve(Cell::new(5, 5), &f), Cell::new(4, 5));

        for (x, y) in [(4, 5), (5, 4), (5, 6)] {
            mask.set(x, y, true).unwrap();
        }
        let f = ObstacleField::build(&mask, 0);
        assert_eq!(FreeCellResolver::default().resolve(Cell::new(5, 5), &f), Cell::new(6, 5));
    }

    #[test]
    fn prefers_axis_neighbor_over_diagonal() {
        let f = field(&[
            ".....", //
            ".###.",
            ".###.",
            ".###.",
            ".....",
        ]);
        let got = FreeCellResolver::new(2).resolve(Cell::new(2, 2), &f);
        assert_eq!(got, Cell::new(0, 2));
    }

    #[test]
    fn exhausted_window_returns_input() {
        let mut mask = ObstacleMask::new(20, 20);
        mask.fill_rect(0, 0, 20, 20, true);
        mask.set(19, 19, false).unwrap();
        let f = ObstacleField::build(&mask, 0);
        let r = FreeCellResolver::new(3);
        assert_eq!(r.resolve(Cell::new(4, 4), &f), Cell::new(4, 4));
    }

    #[test]
    fn resolved_cells_are_idempotent_and_local() {
        let mask = ObstacleMask::from_ascii(&[
            "############",
            "#####...####",
            "############",
            "###.########",
            "############",
            "############",
            "############",
            "############",
            "############",
            "###########.",
        ])
        .unwrap();
        let f = ObstacleField::build(&mask, 0);
        let r = FreeCellResolver::new(2);
        for y in 0..10 {
            for x in 0..12 {
                let c = Cell::new(x, y);
                let once = r.resolve(c, &f);
                assert_eq!(r.resolve(once, &f), once);
                if once != c {
                    assert!(f.is_walkable(once));
                    assert!(once.x.abs_diff(c.x) <= 2 && once.y.abs_diff(c.y) <= 2);
                }
            }
        }
    }

    #[test]
    fn window_is_clamped_at_edges() {
        let f = field(&["#.", "##"]);
        assert_eq!(FreeCellResolver::default().resolve(Cell::new(0, 1), &f), Cell::new(1, 0));
    }
}
