// Obstacle-aware multi-agent motion on a 2-D grid.
// The engine module holds the tick-driven core; the viewer binary in main.rs
// only feeds it pointer state and draws the snapshots it returns.

pub mod engine;
