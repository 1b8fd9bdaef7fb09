// Per-tick destination policy.
//
// Engaged: every agent takes a slot on a circle around the pointer focus.
//          The circle rotates a little every tick and slots are spaced
//          evenly, 2π/N apart.
// Idle:    agents trade places. The "previous" targets become the new
//          "current" targets in shuffled order, and the old current set is
//          kept as the next exchange's source.

use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::{IVec2, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::cell::Cell;
use super::error::ConfigError;
use super::obstacle::ObstacleField;
use super::resolver::FreeCellResolver;

// ============================================================================
// FORMATION
// ============================================================================

/// Rotating orbit around the pointer.
#[derive(Debug, Clone, Copy)]
pub struct Formation {
    /// Current rotation, always in `[0, 2π)`.
    theta: f32,
    pub spin_rate: f32,
    pub radius: f32,
}

impl Formation {
    pub fn new(radius: f32, spin_rate: f32) -> Self {
        Self {
            theta: 0.0,
            spin_rate,
            radius,
        }
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn advance(&mut self) {
        self.theta = (self.theta + self.spin_rate).rem_euclid(TAU);
    }

    /// Slot angle of agent `i` out of `n`.
    #[inline]
    pub fn angle_of(&self, i: usize, n: usize) -> f32 {
        self.theta + TAU * i as f32 / n as f32
    }

    /// Raw orbit point for agent `i`, before clamping and resolving.
    pub fn slot(&self, focus: IVec2, i: usize, n: usize) -> Vec2 {
        let phi = self.angle_of(i, n);
        focus.as_vec2() + self.radius * Vec2::new(phi.cos(), phi.sin())
    }
}

// ============================================================================
// TARGET POOL
// ============================================================================

/// The idle-mode target sets, one entry per agent in each.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPool {
    current: Vec<Cell>,
    previous: Vec<Cell>,
}

impl TargetPool {
    pub fn new(current: Vec<Cell>, previous: Vec<Cell>) -> Result<Self, ConfigError> {
        if current.len() != previous.len() || current.is_empty() {
            return Err(ConfigError::LayoutMismatch {
                agents: current.len(),
                starts: previous.len(),
                defaults: current.len(),
            });
        }
        Ok(Self { current, previous })
    }

    pub fn current(&self) -> &[Cell] {
        &self.current
    }

    pub fn previous(&self) -> &[Cell] {
        &self.previous
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Swap the two sets and shuffle the new current set.
    pub fn exchange<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.shuffle(rng);
    }
}

// ============================================================================
// TARGET ASSIGNER
// ============================================================================

/// Result of an idle retarget: one target and one fresh budget per agent.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleAssignment {
    pub targets: Vec<Cell>,
    pub budgets: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct TargetAssigner {
    formation: Formation,
    pool: TargetPool,
    idle_budget: RangeInclusive<u32>,
}

impl TargetAssigner {
    pub fn new(formation: Formation, pool: TargetPool, idle_budget: RangeInclusive<u32>) -> Self {
        Self {
            formation,
            pool,
            idle_budget,
        }
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    /// Rotate the formation one step and return a free-cell target per agent.
    /// `focus` may lie off the grid; each slot is clamped before resolving.
    pub fn engaged(
        &mut self,
        focus: IVec2,
        resolver: &FreeCellResolver,
        field: &ObstacleField,
    ) -> Vec<Cell> {
        self.formation.advance();
        let n = self.pool.len();
        let bounds = field.bounds();
        (0..n)
            .map(|i| {
                let candidate = bounds.clamp_point(self.formation.slot(focus, i, n));
                resolver.resolve(candidate, field)
            })
            .collect()
    }

    /// Exchange the pool and draw a new budget per agent.
    pub fn idle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> IdleAssignment {
        self.pool.exchange(rng);
        let budgets = (0..self.pool.len())
            .map(|_| rng.gen_range(self.idle_budget.clone()))
            .collect();
        IdleAssignment {
            targets: self.pool.current().to_vec(),
            budgets,
        }
    }

    /// Current defaults, unshuffled. Used by the release reset.
    pub fn defaults(&self) -> &[Cell] {
        self.pool.current()
    }
}
