// Error types for the motion engine.
//
// Unreachable targets and exhausted resolver windows are normal outcomes and
// never show up here; these enums only cover malformed input.

use thiserror::Error;

/// Failures of grid-indexed queries and grid construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("grid shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("agent count must be at least 1")]
    NoAgents,

    #[error("budget range {start}..={end} is empty")]
    EmptyBudgetRange { start: u32, end: u32 },

    #[error("engaged budget must be positive")]
    ZeroEngagedBudget,

    #[error("orbit radius must be finite and positive, got {0}")]
    InvalidOrbitRadius(f32),

    #[error("spin rate must be finite, got {0}")]
    InvalidSpinRate(f32),

    #[error("inflate radius {radius} exceeds the limit of {max} cells")]
    InflateRadiusTooLarge { radius: u32, max: u32 },

    #[error("layout has {starts} start cells and {defaults} default targets for {agents} agents")]
    LayoutMismatch {
        agents: usize,
        starts: usize,
        defaults: usize,
    },

    #[error("maze tile size must be at least 2 cells, got {0}")]
    TileTooSmall(u32),
}

/// Session construction failures.
#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("maze generation failed after {attempts} attempts")]
    MazeGenerationExhausted { attempts: u32 },
}
