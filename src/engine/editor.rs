// Click-to-toggle tile grid.
//
// A press flips one tile and remembers the value it flipped to; dragging with
// the button held paints that remembered value. Changes come back as return
// values instead of being broadcast, so whoever drives the editor decides
// what to rebuild.

use super::cell::{Bounds, Cell};
use super::error::GridError;
use super::obstacle::ObstacleMask;

pub const DEFAULT_EDITOR_SIZE: (u32, u32) = (32, 32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// A press flipped the tile.
    Toggled { cell: Cell, value: bool },
    /// A drag painted the last toggle value onto the tile.
    Painted { cell: Cell, value: bool },
}

#[derive(Debug, Clone)]
pub struct TileEditor {
    tiles: Vec<bool>,
    bounds: Bounds,
    paint_value: bool,
}

impl Default for TileEditor {
    fn default() -> Self {
        Self::new(DEFAULT_EDITOR_SIZE.0, DEFAULT_EDITOR_SIZE.1)
    }
}

impl TileEditor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tiles: vec![false; width as usize * height as usize],
            bounds: Bounds::new(width, height),
            paint_value: true,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn get(&self, x: i64, y: i64) -> Result<bool, GridError> {
        Ok(self.tiles[self.bounds.index(x, y)?])
    }

    pub fn set(&mut self, x: i64, y: i64, value: bool) -> Result<(), GridError> {
        let idx = self.bounds.index(x, y)?;
        self.tiles[idx] = value;
        Ok(())
    }

    /// Primary-button press on a tile. Negative coordinates (pointer off the
    /// grid) are ignored.
    pub fn press(&mut self, x: i64, y: i64) -> Result<Option<EditEvent>, GridError> {
        if x < 0 || y < 0 {
            return Ok(None);
        }
        let value = !self.get(x, y)?;
        self.set(x, y, value)?;
        self.paint_value = value;
        Ok(Some(EditEvent::Toggled {
            cell: Cell::new(x as u32, y as u32),
            value,
        }))
    }

    /// Pointer entered a new tile with the primary button held.
    pub fn drag(&mut self, x: i64, y: i64) -> Result<Option<EditEvent>, GridError> {
        if x < 0 || y < 0 {
            return Ok(None);
        }
        self.set(x, y, self.paint_value)?;
        Ok(Some(EditEvent::Painted {
            cell: Cell::new(x as u32, y as u32),
            value: self.paint_value,
        }))
    }

    /// Copy the tiles into an obstacle mask, `true` = wall. Fails for a
    /// zero-sized editor.
    pub fn to_mask(&self) -> Result<ObstacleMask, GridError> {
        ObstacleMask::from_cells(self.bounds.width, self.bounds.height, self.tiles.clone())
    }
}
