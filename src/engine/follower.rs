// Greedy waypoint consumption with a per-tick step budget.
//
// One budget unit = one unit step along a single axis. X is corrected before
// Y, which matches the L1 metric the planner works in. A waypoint is popped
// for free, but only once the loop visits it with budget left, so an agent
// that lands on its goal with its last unit stays "moving" until next tick.

use std::collections::VecDeque;

use super::cell::Cell;

/// Advance `position` along `path`, spending at most `budget` unit steps.
/// Reached waypoints are popped from the front of `path`. Returns the new
/// position; an empty `path` afterwards means the agent has arrived.
pub fn advance(mut position: Cell, path: &mut VecDeque<Cell>, mut budget: u32) -> Cell {
    while budget > 0 {
        let Some(&next) = path.front() else {
            break;
        };
        if position.x < next.x {
            position.x += 1;
        } else if position.x > next.x {
            position.x -= 1;
        } else if position.y < next.y {
            position.y += 1;
        } else if position.y > next.y {
            position.y -= 1;
        } else {
            path.pop_front();
            continue;
        }
        budget -= 1;
    }
    position
}
