// Grid-to-screen mapping for the viewer.
//
// Camera model:
//   - Fixed top-down orthographic view, one grid cell = `cell_px` pixels
//   - Pixel origin at the window's top-left corner, Y pointing down
//   - The grid is sized from the window, so there is no pan or zoom

use glam::{IVec2, Mat4, Vec2};

use super::cell::{Bounds, Cell};

pub struct GridCamera {
    /// Pixels per grid cell.
    pub cell_px: f32,
    /// Window size in physical pixels.
    viewport: (u32, u32),
}

impl GridCamera {
    pub fn new(cell_px: f32) -> Self {
        Self {
            cell_px,
            viewport: (0, 0),
        }
    }

    /// Returns true if the viewport changed. Zero-sized (minimized) windows
    /// are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == self.viewport {
            return false;
        }
        self.viewport = (width, height);
        true
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Grid dimensions that fill the current viewport.
    pub fn grid_bounds(&self) -> Bounds {
        let w = (self.viewport.0 as f32 / self.cell_px).ceil() as u32;
        let h = (self.viewport.1 as f32 / self.cell_px).ceil() as u32;
        Bounds::new(w.max(2), h.max(2))
    }

    /// Pixel-space orthographic projection, Y down.
    pub fn view_projection(&self) -> Mat4 {
        let (w, h) = (self.viewport.0.max(1) as f32, self.viewport.1.max(1) as f32);
        Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
    }

    /// Pixel centre of a grid cell.
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        (cell.as_vec2() + Vec2::splat(0.5)) * self.cell_px
    }

    /// Grid cell under a cursor position. May lie outside the grid.
    pub fn screen_to_cell(&self, pos: Vec2) -> IVec2 {
        (pos / self.cell_px).floor().as_ivec2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn grid_covers_the_viewport() {
        let mut cam = GridCamera::new(2.0);
        cam.resize(1281, 720);
        assert_eq!(cam.grid_bounds(), Bounds::new(641, 360));
    }

    #[test]
    fn resize_reports_real_changes_only() {
        let mut cam = GridCamera::new(2.0);
        assert!(cam.resize(800, 600));
        assert!(!cam.resize(800, 600));
        assert!(!cam.resize(0, 600));
        assert_eq!(cam.viewport(), (800, 600));
        assert!(cam.resize(800, 601));
    }

    #[test]
    fn screen_and_cell_round_trip() {
        let cam = GridCamera::new(4.0);
        let c = Cell::new(10, 3);
        assert_eq!(cam.cell_center(c), Vec2::new(42.0, 14.0));
        assert_eq!(cam.screen_to_cell(cam.cell_center(c)), IVec2::new(10, 3));
        assert_eq!(cam.screen_to_cell(Vec2::new(-1.0, 5.0)), IVec2::new(-1, 1));
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let mut cam = GridCamera::new(1.0);
        cam.resize(200, 100);
        let vp = cam.view_projection();
        let top_left = vp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = vp * Vec4::new(200.0, 100.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-5 && (top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5 && (bottom_right.y + 1.0).abs() < 1e-5);
    }
}
