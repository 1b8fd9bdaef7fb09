// ECS components for the viewer's render entities.
// The motion core never touches these; systems.rs mirrors each tick snapshot
// into them and the renderer reads them back as instances.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};

/// Screen-space position in pixels. `z` orders layers (agents above walls).
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position }
    }
}

/// Width/height of the quad in pixels.
#[derive(Component, Debug, Clone, Copy)]
pub struct Extent {
    pub size: Vec2,
}

/// RGB color for rendering
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

/// Background fill.
pub const COLOR_BACKGROUND: Color = Color::rgb8(0x76, 0x48, 0x8F);
/// Maze walls and nameplate.
pub const COLOR_WALL: Color = Color::rgb8(0xFF, 0xDF, 0xB1);
/// Agent palette, cycled by agent index.
pub const AGENT_PALETTE: [Color; 5] = [
    Color::rgb8(0x88, 0xB7, 0xE1),
    Color::rgb8(0xA5, 0xCE, 0xF4),
    Color::rgb8(0x96, 0xC3, 0xE3),
    Color::rgb8(0x7C, 0xA9, 0xD2),
    Color::rgb8(0x70, 0x9B, 0xC1),
];

/// Links a render entity to agent `index` in the coordinator.
#[derive(Component, Debug, Clone, Copy)]
pub struct AgentSprite {
    pub index: usize,
}

/// One horizontal run of obstructed mask cells.
#[derive(Component, Debug, Clone, Copy)]
pub struct ObstacleSpan;

/// Drawn as a disc inscribed in its extent instead of a square.
#[derive(Component, Debug, Clone, Copy)]
pub struct Round;
