// Shortest-path contract consumed by the coordinator, plus the grid planner
// the viewer plugs into it.
//
// The coordinator never computes paths itself. It hands a PathSource the
// obstacle field, a start and a goal, and takes whatever waypoints come back.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::cell::{l1_distance, Cell};
use super::obstacle::ObstacleField;

// ============================================================================
// CONTRACT
// ============================================================================

/// External planner under the L1 metric.
///
/// `search` appends an ordered waypoint sequence from `start` to `goal` that
/// avoids blocked cells, with consecutive waypoints joined by axis-aligned
/// runs. When no path exists, or either endpoint is blocked, `out` must be
/// left exactly as it was.
pub trait PathSource {
    fn search(&mut self, field: &ObstacleField, start: Cell, goal: Cell, out: &mut Vec<Cell>);
}

// ============================================================================
// GRID PLANNER
// ============================================================================

const UNVISITED: u32 = u32::MAX;
const NO_PARENT: u32 = u32::MAX;

/// 4-connected A* with a Manhattan heuristic.
///
/// Emits the start cell, every corner where the path turns, and the goal.
/// Scratch buffers are stamped with a generation counter so consecutive
/// searches on the same field skip re-clearing them.
#[derive(Default)]
pub struct GridPlanner {
    cost: Vec<u32>,
    parent: Vec<u32>,
    stamp: Vec<u32>,
    generation: u32,
    open: BinaryHeap<OpenNode>,
    /// Total searches run; the viewer shows it in the overlay.
    pub searches: u64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    idx: u32,
    f: u32,
    g: u32,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert for lowest f first, deeper g on ties.
        other.f.cmp(&self.f).then_with(|| self.g.cmp(&other.g))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl GridPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, area: usize) {
        if self.stamp.len() != area {
            self.cost = vec![UNVISITED; area];
            self.parent = vec![NO_PARENT; area];
            self.stamp = vec![0; area];
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamp.fill(0);
            self.generation = 1;
        }
        self.open.clear();
    }

    #[inline]
    fn cost_of(&self, idx: usize) -> u32 {
        if self.stamp[idx] == self.generation {
            self.cost[idx]
        } else {
            UNVISITED
        }
    }
}

impl PathSource for GridPlanner {
    fn search(&mut self, field: &ObstacleField, start: Cell, goal: Cell, out: &mut Vec<Cell>) {
        self.searches += 1;
        if !field.is_walkable(start) || !field.is_walkable(goal) {
            return;
        }

        let w = field.width();
        let h = field.height();
        self.reset(field.bounds().area());

        let index = |c: Cell| (c.y * w + c.x) as usize;
        let start_idx = index(start);
        let goal_idx = index(goal);

        self.stamp[start_idx] = self.generation;
        self.cost[start_idx] = 0;
        self.parent[start_idx] = NO_PARENT;
        self.open.push(OpenNode {
            idx: start_idx as u32,
            f: l1_distance(start, goal),
            g: 0,
        });

        let mut found = false;
        while let Some(node) = self.open.pop() {
            let idx = node.idx as usize;
            if node.g > self.cost_of(idx) {
                continue;
            }
            if idx == goal_idx {
                found = true;
                break;
            }

            let cell = Cell::new(idx as u32 % w, idx as u32 / w);
            for nb in cardinal_neighbors(cell, w, h) {
                if !field.is_walkable(nb) {
                    continue;
                }
                let ni = index(nb);
                let g = node.g + 1;
                if g < self.cost_of(ni) {
                    self.stamp[ni] = self.generation;
                    self.cost[ni] = g;
                    self.parent[ni] = idx as u32;
                    self.open.push(OpenNode {
                        idx: ni as u32,
                        f: g + l1_distance(nb, goal),
                        g,
                    });
                }
            }
        }

        if !found {
            log::trace!("no path {:?} -> {:?}", start, goal);
            return;
        }

        let mut cells = Vec::new();
        let mut cur = goal_idx as u32;
        while cur != NO_PARENT {
            cells.push(Cell::new(cur % w, cur / w));
            cur = self.parent[cur as usize];
        }
        cells.reverse();
        compress_corners(&cells, out);
    }
}

/// Keep endpoints and the cells where the direction of travel changes.
fn compress_corners(cells: &[Cell], out: &mut Vec<Cell>) {
    let Some(&first) = cells.first() else {
        return;
    };
    out.push(first);
    for win in cells.windows(3) {
        let (a, b, c) = (win[0], win[1], win[2]);
        let straight = (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y);
        if !straight {
            out.push(b);
        }
    }
    if cells.len() > 1 {
        out.push(cells[cells.len() - 1]);
    }
}

/// The four cardinal (N/S/E/W) grid neighbors of a cell, clamped to bounds.
fn cardinal_neighbors(pos: Cell, w: u32, h: u32) -> impl Iterator<Item = Cell> {
    let (x, y) = (pos.x as i64, pos.y as i64);
    let (wi, hi) = (w as i64, h as i64);
    [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
        .into_iter()
        .filter(move |&(nx, ny)| nx >= 0 && ny >= 0 && nx < wi && ny < hi)
        .map(|(nx, ny)| Cell::new(nx as u32, ny as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::obstacle::ObstacleMask;

    fn walk_length(path: &[Cell]) -> u32 {
        path.windows(2).map(|w| l1_distance(w[0], w[1])).sum()
    }

    #[test]
    fn straight_line_is_two_waypoints() {
        let field = ObstacleField::new_open(10, 10);
        let mut out = Vec::new();
        GridPlanner::new().search(&field, Cell::new(1, 3), Cell::new(8, 3), &mut out);
        assert_eq!(out, vec![Cell::new(1, 3), Cell::new(8, 3)]);
    }

    #[test]
    fn detour_is_shortest_and_axis_aligned() {
        let mask = ObstacleMask::from_ascii(&[
            "..........",
            "..........",
            "#########.",
            "..........",
        ])
        .unwrap();
        let field = ObstacleField::build(&mask, 0);
        let mut out = Vec::new();
        GridPlanner::new().search(&field, Cell::new(0, 0), Cell::new(0, 3), &mut out);

        assert_eq!(out.first(), Some(&Cell::new(0, 0)));
        assert_eq!(out.last(), Some(&Cell::new(0, 3)));
        for w in out.windows(2) {
            assert!(w[0].x == w[1].x || w[0].y == w[1].y);
        }
        assert_eq!(walk_length(&out), 9 + 3 + 9);
    }

    #[test]
    fn unreachable_goal_leaves_output_untouched() {
        let mask = ObstacleMask::from_ascii(&["..#..", "..#..", "..#.."]).unwrap();
        let field = ObstacleField::build(&mask, 0);
        let mut out = vec![Cell::new(7, 7)];
        let mut planner = GridPlanner::new();
        planner.search(&field, Cell::new(0, 0), Cell::new(4, 2), &mut out);
        assert_eq!(out, vec![Cell::new(7, 7)]);

        planner.search(&field, Cell::new(2, 0), Cell::new(0, 0), &mut out);
        assert_eq!(out, vec![Cell::new(7, 7)]);
        assert_eq!(planner.searches, 2);
    }

    #[test]
    fn same_cell_yields_single_waypoint() {
        let field = ObstacleField::new_open(3, 3);
        let mut out = Vec::new();
        GridPlanner::new().search(&field, Cell::new(1, 1), Cell::new(1, 1), &mut out);
        assert_eq!(out, vec![Cell::new(1, 1)]);
    }

    #[test]
    fn scratch_is_reused_across_searches() {
        let field = ObstacleField::new_open(6, 6);
        let mut planner = GridPlanner::new();
        for i in 0..5u32 {
            let mut out = Vec::new();
            planner.search(&field, Cell::new(0, i), Cell::new(5, 5 - i), &mut out);
            assert_eq!(walk_length(&out), 5 + (5 - 2 * i as i32).unsigned_abs());
        }
    }
}
