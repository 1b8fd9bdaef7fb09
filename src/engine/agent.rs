// Agent state owned by the coordinator.

use std::collections::VecDeque;

use super::cell::Cell;
use super::follower;

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub position: Cell,
    /// Remaining waypoints, consumed front to back. Empty = arrived.
    pub path: VecDeque<Cell>,
    /// Idle-mode step budget; engaged ticks override it.
    pub budget: u32,
    pub target: Cell,
}

impl Agent {
    pub fn new(position: Cell, target: Cell, budget: u32) -> Self {
        Self {
            position,
            path: VecDeque::new(),
            budget,
            target,
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        !self.path.is_empty()
    }

    /// Move along the current path with `budget` unit steps.
    pub fn follow(&mut self, budget: u32) {
        self.position = follower::advance(self.position, &mut self.path, budget);
    }
}
