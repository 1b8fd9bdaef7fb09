// ECS systems that mirror coordinator state into render entities.
// The world is rebuilt on resize and synced from the tick snapshot every frame.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};

use super::camera::GridCamera;
use super::components::*;
use super::coordinator::TickSnapshot;
use super::obstacle::ObstacleMask;

const WALL_LAYER: f32 = 0.0;
const AGENT_LAYER: f32 = 0.5;

/// Flattened render entity, ready to become GPU instance data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub center: Vec3,
    pub size: Vec2,
    pub color: Color,
    pub round: bool,
}

/// Spawn one disc per agent, colored from the palette.
pub fn spawn_agent_sprites(world: &mut World, count: usize, diameter_px: f32) {
    for index in 0..count {
        world.spawn((
            AgentSprite { index },
            Transform::from_position(Vec3::new(0.0, 0.0, AGENT_LAYER)),
            Extent {
                size: Vec2::splat(diameter_px),
            },
            AGENT_PALETTE[index % AGENT_PALETTE.len()],
            Round,
        ));
    }
}

/// Merge each row's obstructed cells into horizontal runs and spawn one
/// quad per run. Returns the number of spans spawned.
pub fn spawn_obstacle_spans(world: &mut World, mask: &ObstacleMask, camera: &GridCamera) -> usize {
    let bounds = mask.bounds();
    let px = camera.cell_px;
    let mut spawned = 0;

    for y in 0..bounds.height as i64 {
        let mut x = 0;
        while x < bounds.width as i64 {
            if mask.get(x, y) != Ok(true) {
                x += 1;
                continue;
            }
            let start = x;
            while x < bounds.width as i64 && mask.get(x, y) == Ok(true) {
                x += 1;
            }
            let len = (x - start) as f32;
            world.spawn((
                ObstacleSpan,
                Transform::from_position(Vec3::new(
                    (start as f32 + len * 0.5) * px,
                    (y as f32 + 0.5) * px,
                    WALL_LAYER,
                )),
                Extent {
                    size: Vec2::new(len * px, px),
                },
                COLOR_WALL,
            ));
            spawned += 1;
        }
    }
    spawned
}

/// Remove every entity from the world (used before a rebuild).
pub fn clear_world(world: &mut World) {
    world.clear_entities();
}

/// Move agent discs to the positions in `snapshot`.
pub fn sync_agent_sprites(world: &mut World, snapshot: &TickSnapshot, camera: &GridCamera) {
    let mut query = world.query::<(&AgentSprite, &mut Transform)>();
    for (sprite, mut transform) in query.iter_mut(world) {
        if let Some(cell) = snapshot.positions.get(sprite.index) {
            let p = camera.cell_center(*cell);
            transform.position = Vec3::new(p.x, p.y, AGENT_LAYER);
        }
    }
}

/// Read every drawable entity back out, walls first.
pub fn collect_instances(world: &mut World) -> Vec<SpriteInstance> {
    let mut query = world.query::<(&Transform, &Extent, &Color, Has<Round>)>();
    let mut out: Vec<SpriteInstance> = query
        .iter(world)
        .map(|(transform, extent, color, round)| SpriteInstance {
            center: transform.position,
            size: extent.size,
            color: *color,
            round,
        })
        .collect();
    out.sort_by(|a, b| a.center.z.total_cmp(&b.center.z));
    out
}
