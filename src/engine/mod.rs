// Engine module - grid motion core plus the viewer's ECS/render glue
// The core (obstacle .. coordinator) has no window or GPU dependencies.

pub mod agent;
pub mod camera;
pub mod cell;
pub mod components;
pub mod config;
pub mod coordinator;
pub mod debug_overlay;
pub mod editor;
pub mod error;
pub mod follower;
pub mod input;
pub mod maze;
pub mod obstacle;
pub mod path_source;
pub mod resolver;
pub mod systems;
pub mod targeting;

// Re-export commonly used items
pub use agent::Agent;
pub use cell::{Bounds, Cell};
pub use config::SwarmConfig;
pub use coordinator::{Layout, MotionCoordinator, PointerInput, SessionState, TickSnapshot};
pub use error::{ConfigError, GridError, InitError};
pub use obstacle::{ObstacleField, ObstacleMask};
pub use path_source::{GridPlanner, PathSource};
pub use resolver::FreeCellResolver;
pub use targeting::{Formation, TargetAssigner, TargetPool};
