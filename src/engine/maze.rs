// Obstacle mask source for the viewer: a random perfect maze drawn over the
// grid, with open bands at the top and bottom where the agents park and a
// cleared title box holding a solid nameplate in the middle.
//
// Generation can fail (degenerate lattices), so the public entry point
// retries up to a fixed number of attempts and then gives up with an
// initialization error.

use rand::seq::SliceRandom;
use rand::Rng;

use super::error::{ConfigError, InitError};
use super::obstacle::ObstacleMask;

/// Wall on the tile's top edge.
const WALL_TOP: u8 = 8;
/// Wall on the tile's left edge.
const WALL_LEFT: u8 = 1;
/// Wall on the tile's right edge.
const WALL_RIGHT: u8 = 2;
/// Wall on the tile's bottom edge.
const WALL_BOTTOM: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct MazeConfig {
    /// Tile edge length in cells.
    pub tile: u32,
    /// Wall stroke thickness in cells.
    pub wall: u32,
    pub max_attempts: u32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            tile: 16,
            wall: 3,
            max_attempts: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    EmptyLattice { cols: u32, rows: u32 },
    Disconnected { visited: usize, total: usize },
}

/// Wall bitmask per tile, `walls[col][row]`.
#[derive(Debug, Clone)]
pub struct Maze {
    pub cols: u32,
    pub rows: u32,
    walls: Vec<u8>,
}

impl Maze {
    pub fn walls(&self, col: u32, row: u32) -> u8 {
        self.walls[(col * self.rows + row) as usize]
    }

    pub fn has_top(&self, col: u32, row: u32) -> bool {
        self.walls(col, row) & WALL_TOP != 0
    }

    pub fn has_left(&self, col: u32, row: u32) -> bool {
        self.walls(col, row) & WALL_LEFT != 0
    }
}

/// Carve a perfect maze with a randomized depth-first walk.
pub fn try_generate<R: Rng + ?Sized>(cols: u32, rows: u32, rng: &mut R) -> Result<Maze, MazeError> {
    if cols == 0 || rows == 0 {
        return Err(MazeError::EmptyLattice { cols, rows });
    }
    let total = (cols * rows) as usize;
    let idx = |c: u32, r: u32| (c * rows + r) as usize;
    let mut walls = vec![WALL_TOP | WALL_LEFT | WALL_RIGHT | WALL_BOTTOM; total];
    let mut visited = vec![false; total];

    let start = (rng.gen_range(0..cols), rng.gen_range(0..rows));
    visited[idx(start.0, start.1)] = true;
    let mut stack = vec![start];
    let mut seen = 1;

    while let Some(&(c, r)) = stack.last() {
        let mut options: Vec<(u32, u32, u8, u8)> = Vec::with_capacity(4);
        if r > 0 && !visited[idx(c, r - 1)] {
            options.push((c, r - 1, WALL_TOP, WALL_BOTTOM));
        }
        if r + 1 < rows && !visited[idx(c, r + 1)] {
            options.push((c, r + 1, WALL_BOTTOM, WALL_TOP));
        }
        if c > 0 && !visited[idx(c - 1, r)] {
            options.push((c - 1, r, WALL_LEFT, WALL_RIGHT));
        }
        if c + 1 < cols && !visited[idx(c + 1, r)] {
            options.push((c + 1, r, WALL_RIGHT, WALL_LEFT));
        }

        match options.choose(rng) {
            Some(&(nc, nr, here, there)) => {
                walls[idx(c, r)] &= !here;
                walls[idx(nc, nr)] &= !there;
                visited[idx(nc, nr)] = true;
                seen += 1;
                stack.push((nc, nr));
            }
            None => {
                stack.pop();
            }
        }
    }

    if seen != total {
        return Err(MazeError::Disconnected {
            visited: seen,
            total,
        });
    }
    Ok(Maze { cols, rows, walls })
}

/// Retry `try_generate` until it succeeds or `max_attempts` is used up.
pub fn generate_with_retry<R: Rng + ?Sized>(
    cols: u32,
    rows: u32,
    max_attempts: u32,
    rng: &mut R,
) -> Result<Maze, InitError> {
    for attempt in 1..=max_attempts {
        match try_generate(cols, rows, rng) {
            Ok(maze) => return Ok(maze),
            Err(e) => log::warn!("maze attempt {}/{} failed: {:?}", attempt, max_attempts, e),
        }
    }
    Err(InitError::MazeGenerationExhausted {
        attempts: max_attempts,
    })
}

fn round_down_to(x: f64, s: f64) -> i64 {
    ((x / s).floor() * s) as i64
}

fn round_up_to(x: f64, s: f64) -> i64 {
    ((x / s).ceil() * s) as i64
}

/// Draw `maze` into a `width x height` mask, then clear the parking bands and
/// title box and stamp the nameplate.
pub fn rasterize(maze: &Maze, width: u32, height: u32, cfg: &MazeConfig) -> ObstacleMask {
    let mut mask = ObstacleMask::new(width, height);
    let t = cfg.tile as i64;
    let half = (cfg.wall / 2) as i64;
    let thick = cfg.wall.max(1) as i64;

    for c in 0..maze.cols {
        for r in 0..maze.rows {
            let x = c as i64 * t;
            let y = r as i64 * t;
            if maze.has_top(c, r) {
                mask.fill_rect(x - half, y - half, x + t + half + 1, y - half + thick, true);
            }
            if maze.has_left(c, r) {
                mask.fill_rect(x - half, y - half, x - half + thick, y + t + half + 1, true);
            }
        }
    }

    let w = width as f64;
    let h = height as f64;
    let s = cfg.tile as f64;
    let pad = cfg.wall as i64;

    // parking bands
    mask.fill_rect(0, 0, width as i64, round_up_to(0.15 * h, s) + 2 * pad, false);
    mask.fill_rect(0, round_down_to(0.85 * h, s) - pad, width as i64, height as i64, false);

    // title box and nameplate
    let font = (0.1 * w).floor();
    let y0 = round_down_to(0.5 * h - 0.55 * font, s) - pad;
    let box_h = round_up_to(1.1 * font, s) + 2 * pad;
    let x0 = round_down_to(0.1 * w, s) - pad;
    let box_w = round_up_to(0.8 * w, s) + 2 * pad;
    mask.fill_rect(x0, y0, x0 + box_w, y0 + box_h, false);

    let plate_h = (0.6 * font) as i64;
    let plate_w = (0.6 * w) as i64;
    let cy = y0 + box_h / 2;
    let cx = (0.5 * w) as i64;
    mask.fill_rect(cx - plate_w / 2, cy - plate_h / 2, cx + plate_w / 2, cy + plate_h / 2, true);

    mask
}

/// Generate a maze sized to cover the grid and rasterize it.
pub fn generate_mask<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    cfg: &MazeConfig,
    rng: &mut R,
) -> Result<ObstacleMask, InitError> {
    if cfg.tile < 2 {
        return Err(ConfigError::TileTooSmall(cfg.tile).into());
    }
    let cols = width.div_ceil(cfg.tile);
    let rows = height.div_ceil(cfg.tile);
    let maze = generate_with_retry(cols, rows, cfg.max_attempts, rng)?;
    log::debug!("maze {}x{} tiles over {}x{} cells", cols, rows, width, height);
    Ok(rasterize(&maze, width, height, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cell::Cell;
    use crate::engine::obstacle::ObstacleField;
    use crate::engine::path_source::{GridPlanner, PathSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn perfect_maze_has_spanning_tree_edges() {
        let mut rng = StdRng::seed_from_u64(11);
        let maze = try_generate(7, 5, &mut rng).unwrap();
        // a spanning tree over 35 tiles removes 34 internal walls
        let mut open = 0;
        for c in 0..7 {
            for r in 0..5 {
                if c > 0 && !maze.has_left(c, r) {
                    open += 1;
                }
                if r > 0 && !maze.has_top(c, r) {
                    open += 1;
                }
            }
        }
        assert_eq!(open, 34);
        // the outer boundary stays closed
        assert!((0..5).all(|r| maze.has_left(0, r)));
        assert!((0..7).all(|c| maze.has_top(c, 0)));
    }

    #[test]
    fn empty_lattice_exhausts_retries() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            try_generate(0, 4, &mut rng).unwrap_err(),
            MazeError::EmptyLattice { cols: 0, rows: 4 }
        );
        let err = generate_with_retry(0, 4, 3, &mut rng).unwrap_err();
        assert!(matches!(err, InitError::MazeGenerationExhausted { attempts: 3 }));
    }

    #[test]
    fn tiny_tiles_are_rejected() {
        let cfg = MazeConfig {
            tile: 1,
            ..Default::default()
        };
        let err = generate_mask(32, 32, &cfg, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, InitError::Config(ConfigError::TileTooSmall(1))));
    }

    #[test]
    fn parking_bands_are_open_and_connected() {
        let cfg = MazeConfig {
            tile: 12,
            wall: 2,
            max_attempts: 4,
        };
        let (w, h) = (240, 120);
        let mask = generate_mask(w, h, &cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        let top = (0.1 * h as f64) as i64;
        let bottom = (0.9 * h as f64) as i64;
        for x in 0..w as i64 {
            assert_eq!(mask.get(x, top), Ok(false));
            assert_eq!(mask.get(x, bottom), Ok(false));
        }
        // nameplate is solid
        assert_eq!(mask.get(w as i64 / 2, h as i64 / 2), Ok(true));

        let field = ObstacleField::build(&mask, 2);
        let mut out = Vec::new();
        GridPlanner::new().search(&field, Cell::new(24, top as u32), Cell::new(216, bottom as u32), &mut out);
        assert!(!out.is_empty(), "bands should connect through the maze");
    }
}
