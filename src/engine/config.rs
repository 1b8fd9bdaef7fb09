// Session tuning. Defaults are the reference demo's values, in grid cells.

use std::ops::RangeInclusive;

use super::error::ConfigError;
use super::resolver::DEFAULT_SEARCH_HALF_WIDTH;

/// Number of agents in the pool.
pub const AGENT_COUNT: usize = 20;
/// Agent radius; the obstacle mask is dilated by this much.
pub const AGENT_RADIUS: u32 = 5;
/// Distance from the pointer focus to each orbit slot.
pub const ORBIT_RADIUS: f32 = 30.0;
/// Formation rotation per engaged tick, in radians.
pub const SPIN_RATE: f32 = 0.005;
/// Step budget for every agent while engaged.
pub const ENGAGED_BUDGET: u32 = 10;
/// Largest accepted agent radius.
pub const MAX_INFLATE_RADIUS: u32 = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct SwarmConfig {
    pub agent_count: usize,
    pub inflate_radius: u32,
    pub search_half_width: u32,
    pub orbit_radius: f32,
    pub spin_rate: f32,
    pub engaged_budget: u32,
    /// Budget drawn per agent at every idle reshuffle.
    pub idle_budget: RangeInclusive<u32>,
    /// Budget drawn per agent when the session is created.
    pub initial_budget: RangeInclusive<u32>,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            agent_count: AGENT_COUNT,
            inflate_radius: AGENT_RADIUS,
            search_half_width: DEFAULT_SEARCH_HALF_WIDTH,
            orbit_radius: ORBIT_RADIUS,
            spin_rate: SPIN_RATE,
            engaged_budget: ENGAGED_BUDGET,
            idle_budget: 2..=6,
            initial_budget: 2..=3,
            seed: None,
        }
    }
}

impl SwarmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }
        for range in [&self.idle_budget, &self.initial_budget] {
            if range.is_empty() {
                return Err(ConfigError::EmptyBudgetRange {
                    start: *range.start(),
                    end: *range.end(),
                });
            }
        }
        if self.inflate_radius > MAX_INFLATE_RADIUS {
            return Err(ConfigError::InflateRadiusTooLarge {
                radius: self.inflate_radius,
                max: MAX_INFLATE_RADIUS,
            });
        }
        if self.engaged_budget == 0 {
            return Err(ConfigError::ZeroEngagedBudget);
        }
        if !self.orbit_radius.is_finite() || self.orbit_radius <= 0.0 {
            return Err(ConfigError::InvalidOrbitRadius(self.orbit_radius));
        }
        if !self.spin_rate.is_finite() {
            return Err(ConfigError::InvalidSpinRate(self.spin_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SwarmConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = SwarmConfig {
            agent_count: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoAgents));

        #[allow(clippy::reversed_empty_ranges)]
        let cfg = SwarmConfig {
            idle_budget: 6..=2,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyBudgetRange { start: 6, end: 2 })
        );

        let cfg = SwarmConfig {
            orbit_radius: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidOrbitRadius(_))));

        let cfg = SwarmConfig {
            inflate_radius: 50_000,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InflateRadiusTooLarge { radius: 50_000, max: MAX_INFLATE_RADIUS })
        );
    }
}
