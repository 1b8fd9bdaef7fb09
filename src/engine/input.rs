// Pointer state tracking for the viewer.
// Abstracts winit events into the per-tick PointerInput the coordinator reads.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

use super::camera::GridCamera;
use super::coordinator::PointerInput;

pub struct InputState {
    // Mouse, in physical pixels
    pub mouse_position: Vec2,
    primary_held: bool,

    // Edge flags, reset in end_frame()
    pressed_this_frame: bool,
    released_this_frame: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            mouse_position: Vec2::ZERO,
            primary_held: false,
            pressed_this_frame: false,
            released_this_frame: false,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the viewer's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.on_primary_button(*state == ElementState::Pressed);
            }
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.on_primary_button(false);
            }
            _ => {}
        }
    }

    pub fn on_cursor_moved(&mut self, pos: Vec2) {
        self.mouse_position = pos;
    }

    pub fn on_primary_button(&mut self, pressed: bool) {
        if pressed && !self.primary_held {
            self.pressed_this_frame = true;
        } else if !pressed && self.primary_held {
            self.released_this_frame = true;
            log::debug!("pointer release");
        }
        self.primary_held = pressed;
    }

    pub fn is_primary_held(&self) -> bool {
        self.primary_held
    }

    pub fn was_pressed(&self) -> bool {
        self.pressed_this_frame
    }

    pub fn was_released(&self) -> bool {
        self.released_this_frame
    }

    /// Snapshot for this tick, with the cursor converted to grid cells.
    pub fn pointer_input(&self, camera: &GridCamera) -> PointerInput {
        PointerInput {
            engaged: self.is_primary_held(),
            focus: camera.screen_to_cell(self.mouse_position),
        }
    }

    /// Call once per frame after the tick has consumed input.
    pub fn end_frame(&mut self) {
        self.pressed_this_frame = false;
        self.released_this_frame = false;
    }
}
