// Tick driver for the whole agent pool.
//
// Session state machine:
//
//   IdleSettled --engage--> Engaged --release--> Reset --> IdleMoving
//        ^                                                     |
//        +----------------- every path empty ------------------+
//
// Engagement interrupts any state. Idle reshuffles only fire once every
// agent has arrived, so a single slow agent holds back the whole pool.

use glam::IVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::Agent;
use super::cell::{Bounds, Cell};
use super::config::SwarmConfig;
use super::error::{ConfigError, GridError, InitError};
use super::obstacle::{ObstacleField, ObstacleMask};
use super::path_source::PathSource;
use super::resolver::FreeCellResolver;
use super::targeting::{Formation, TargetAssigner, TargetPool};

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

/// Pointer state sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerInput {
    pub engaged: bool,
    /// Pointer position in grid cells. May lie off the grid.
    pub focus: IVec2,
}

impl PointerInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn engaged_at(x: i32, y: i32) -> Self {
        Self {
            engaged: true,
            focus: IVec2::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pointer input and every agent has arrived.
    IdleSettled,
    /// Pointer held; agents orbit the focus.
    Engaged,
    /// The tick the pointer was released on. Paths were cleared and
    /// re-planned toward the unshuffled defaults.
    Reset,
    /// No pointer input, at least one agent still walking.
    IdleMoving,
}

/// What the presentation layer reads after each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub tick: u64,
    pub state: SessionState,
    pub positions: Vec<Cell>,
    /// Agents with a non-empty path at the end of the tick.
    pub active: usize,
    /// True if the idle barrier fired this tick.
    pub reshuffled: bool,
    /// Cumulative search counters for the session.
    pub searches: u64,
    pub failed_searches: u64,
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Starting cells and idle default targets, one per agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub starts: Vec<Cell>,
    pub defaults: Vec<Cell>,
}

impl Layout {
    /// Agents evenly spaced on a line at 10% height between 10% and 90% of
    /// the width; each default target is the mirrored slot at 90% height.
    pub fn line(bounds: Bounds, count: usize) -> Self {
        let w = bounds.width as f64;
        let h = bounds.height as f64;
        let step = if count > 1 {
            0.8 * w / (count - 1) as f64
        } else {
            0.0
        };
        let top = (0.1 * h) as i32;
        let bottom = (0.9 * h) as i32;

        let mut starts = Vec::with_capacity(count);
        let mut defaults = Vec::with_capacity(count);
        for i in 0..count {
            let x = (0.1 * w + i as f64 * step).round() as i32;
            starts.push(bounds.clamp(IVec2::new(x, top)));
            defaults.push(bounds.clamp(IVec2::new(bounds.width as i32 - x, bottom)));
        }
        Self { starts, defaults }
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

pub struct MotionCoordinator<P: PathSource> {
    config: SwarmConfig,
    field: ObstacleField,
    resolver: FreeCellResolver,
    source: P,
    assigner: TargetAssigner,
    agents: Vec<Agent>,
    rng: StdRng,
    state: SessionState,
    engaged: bool,
    tick: u64,
    scratch: Vec<Cell>,
    searches: u64,
    failed_searches: u64,
}

impl<P: PathSource> MotionCoordinator<P> {
    /// Session with the default line layout.
    pub fn new(config: SwarmConfig, field: ObstacleField, source: P) -> Result<Self, InitError> {
        let layout = Layout::line(field.bounds(), config.agent_count);
        Self::from_layout(config, field, source, layout)
    }

    /// Dilate `mask` by the configured agent radius and start a session on it.
    pub fn from_mask(config: SwarmConfig, mask: &ObstacleMask, source: P) -> Result<Self, InitError> {
        let field = ObstacleField::build(mask, config.inflate_radius);
        Self::new(config, field, source)
    }

    pub fn from_layout(
        config: SwarmConfig,
        field: ObstacleField,
        source: P,
        layout: Layout,
    ) -> Result<Self, InitError> {
        config.validate()?;
        let resolver = FreeCellResolver::new(config.search_half_width);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (assigner, agents) = start_session(&config, &field, &resolver, layout, &mut rng)?;

        let mut coordinator = Self {
            config,
            field,
            resolver,
            source,
            assigner,
            agents,
            rng,
            state: SessionState::IdleSettled,
            engaged: false,
            tick: 0,
            scratch: Vec::new(),
            searches: 0,
            failed_searches: 0,
        };
        coordinator.plan_to_defaults();
        Ok(coordinator)
    }

    /// Replace the obstacle field (e.g. after a resize) and restart the
    /// session with a fresh line layout.
    pub fn rebuild(&mut self, mask: &ObstacleMask) -> Result<(), InitError> {
        let field = ObstacleField::build(mask, self.config.inflate_radius);
        let layout = Layout::line(field.bounds(), self.config.agent_count);
        let (assigner, agents) =
            start_session(&self.config, &field, &self.resolver, layout, &mut self.rng)?;

        self.field = field;
        self.assigner = assigner;
        self.agents = agents;
        self.engaged = false;
        self.tick = 0;
        self.searches = 0;
        self.failed_searches = 0;
        self.plan_to_defaults();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn pool(&self) -> &TargetPool {
        self.assigner.pool()
    }

    pub fn formation(&self) -> &Formation {
        self.assigner.formation()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut P {
        &mut self.source
    }

    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_moving()).count()
    }

    pub fn positions(&self) -> Vec<Cell> {
        self.agents.iter().map(|a| a.position).collect()
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance every agent by one tick.
    pub fn tick(&mut self, input: PointerInput) -> TickSnapshot {
        self.tick += 1;
        let mut released = false;

        if input.engaged {
            if !self.engaged {
                log::debug!("tick {}: engaged at {:?}", self.tick, input.focus);
            }
            self.engaged = true;
            let targets = self.assigner.engaged(input.focus, &self.resolver, &self.field);
            self.plan_paths(&targets);
        } else if self.engaged {
            log::debug!("tick {}: released, resetting to default targets", self.tick);
            self.engaged = false;
            released = true;
            for agent in &mut self.agents {
                agent.path.clear();
            }
            self.plan_to_defaults();
        }

        let engaged_budget = self.engaged.then_some(self.config.engaged_budget);
        for agent in &mut self.agents {
            let budget = engaged_budget.unwrap_or(agent.budget);
            agent.follow(budget);
        }

        let mut active = self.active_count();
        let mut reshuffled = false;
        if active == 0 && !self.engaged {
            let assignment = self.assigner.idle(&mut self.rng);
            for (agent, budget) in self.agents.iter_mut().zip(&assignment.budgets) {
                agent.budget = *budget;
            }
            self.plan_paths(&assignment.targets);
            active = self.active_count();
            reshuffled = true;
            log::debug!("tick {}: idle reshuffle, {} agents walking", self.tick, active);
        }

        self.state = if self.engaged {
            SessionState::Engaged
        } else if released {
            SessionState::Reset
        } else if active > 0 {
            SessionState::IdleMoving
        } else {
            SessionState::IdleSettled
        };

        TickSnapshot {
            tick: self.tick,
            state: self.state,
            positions: self.positions(),
            active,
            reshuffled,
            searches: self.searches,
            failed_searches: self.failed_searches,
        }
    }

    fn plan_to_defaults(&mut self) {
        let targets = self.assigner.defaults().to_vec();
        self.plan_paths(&targets);
        if self.active_count() > 0 {
            self.state = SessionState::IdleMoving;
        } else {
            self.state = SessionState::IdleSettled;
        }
    }

    /// Search a fresh path for every agent. A failed search keeps whatever
    /// path the agent already had.
    fn plan_paths(&mut self, targets: &[Cell]) {
        for (i, (agent, target)) in self.agents.iter_mut().zip(targets).enumerate() {
            agent.target = *target;
            self.scratch.clear();
            self.source
                .search(&self.field, agent.position, *target, &mut self.scratch);
            self.searches += 1;
            if self.scratch.is_empty() {
                self.failed_searches += 1;
                log::trace!("agent {}: no path {:?} -> {:?}", i, agent.position, target);
            } else {
                agent.path.clear();
                agent.path.extend(self.scratch.drain(..));
            }
        }
    }
}

/// Sanitize a layout against the field and build the pool and agents.
fn start_session(
    config: &SwarmConfig,
    field: &ObstacleField,
    resolver: &FreeCellResolver,
    layout: Layout,
    rng: &mut StdRng,
) -> Result<(TargetAssigner, Vec<Agent>), InitError> {
    let bounds = field.bounds();
    if bounds.area() == 0 {
        return Err(GridError::ShapeMismatch(format!(
            "{}x{} grid has no cells",
            bounds.width, bounds.height
        ))
        .into());
    }

    let n = config.agent_count;
    if layout.starts.len() != n || layout.defaults.len() != n {
        return Err(ConfigError::LayoutMismatch {
            agents: n,
            starts: layout.starts.len(),
            defaults: layout.defaults.len(),
        }
        .into());
    }

    let sanitize = |c: Cell| {
        let c = bounds.clamp(IVec2::new(c.x as i32, c.y as i32));
        resolver.resolve(c, field)
    };
    let starts: Vec<Cell> = layout.starts.into_iter().map(sanitize).collect();
    let defaults: Vec<Cell> = layout.defaults.into_iter().map(sanitize).collect();

    let agents = starts
        .iter()
        .zip(&defaults)
        .map(|(start, target)| {
            Agent::new(*start, *target, rng.gen_range(config.initial_budget.clone()))
        })
        .collect();

    let pool = TargetPool::new(defaults, starts)?;
    let formation = Formation::new(config.orbit_radius, config.spin_rate);
    let assigner = TargetAssigner::new(formation, pool, config.idle_budget.clone());

    log::info!(
        "session: {}x{} grid, {} blocked cells, {} agents",
        bounds.width,
        bounds.height,
        field.blocked_count(),
        n
    );
    Ok((assigner, agents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cell::l1_distance;
    use crate::engine::path_source::GridPlanner;

    /// Ignores obstacles: walks X first, then Y. Goals listed in `unreachable`
    /// produce no path.
    #[derive(Default)]
    struct ScriptedSource {
        calls: Vec<(Cell, Cell)>,
        unreachable: Vec<Cell>,
    }

    impl PathSource for ScriptedSource {
        fn search(&mut self, _field: &ObstacleField, start: Cell, goal: Cell, out: &mut Vec<Cell>) {
            self.calls.push((start, goal));
            if self.unreachable.contains(&goal) {
                return;
            }
            out.push(start);
            out.push(Cell::new(goal.x, start.y));
            out.push(goal);
        }
    }

    fn config(n: usize) -> SwarmConfig {
        SwarmConfig {
            agent_count: n,
            orbit_radius: 4.0,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn cells(v: &[(u32, u32)]) -> Vec<Cell> {
        v.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    fn three_agents() -> MotionCoordinator<ScriptedSource> {
        let layout = Layout {
            starts: cells(&[(1, 1), (5, 1), (9, 1)]),
            defaults: cells(&[(9, 18), (5, 18), (1, 18)]),
        };
        MotionCoordinator::from_layout(
            config(3),
            ObstacleField::new_open(20, 20),
            ScriptedSource::default(),
            layout,
        )
        .unwrap()
    }

    fn run_until_settled<P: PathSource>(c: &mut MotionCoordinator<P>, limit: usize) -> TickSnapshot {
        for _ in 0..limit {
            let snap = c.tick(PointerInput::idle());
            if snap.reshuffled {
                return snap;
            }
        }
        panic!("pool never settled within {} ticks", limit);
    }

    #[test]
    fn line_layout_mirrors_defaults() {
        let layout = Layout::line(Bounds::new(100, 50), 5);
        assert_eq!(layout.starts, cells(&[(10, 5), (30, 5), (50, 5), (70, 5), (90, 5)]));
        assert_eq!(layout.defaults, cells(&[(90, 45), (70, 45), (50, 45), (30, 45), (10, 45)]));

        let single = Layout::line(Bounds::new(10, 10), 1);
        assert_eq!(single.starts, cells(&[(1, 1)]));
    }

    #[test]
    fn session_start_plans_toward_defaults() {
        let c = three_agents();
        assert_eq!(c.state(), SessionState::IdleMoving);
        assert_eq!(c.source().calls.len(), 3);
        for (agent, goal) in c.agents().iter().zip(c.pool().current()) {
            assert_eq!(agent.target, *goal);
            assert!(agent.is_moving());
            assert!((2..=3).contains(&agent.budget));
        }
        assert_eq!(c.pool().previous(), cells(&[(1, 1), (5, 1), (9, 1)]).as_slice());
    }

    #[test]
    fn layout_is_pulled_out_of_obstacles() {
        let mut mask = ObstacleMask::new(20, 20);
        mask.fill_rect(0, 0, 20, 3, true);
        let field = ObstacleField::build(&mask, 0);
        let layout = Layout {
            starts: cells(&[(4, 1)]),
            defaults: cells(&[(4, 15)]),
        };
        let c = MotionCoordinator::from_layout(config(1), field, ScriptedSource::default(), layout)
            .unwrap();
        assert_eq!(c.agents()[0].position, Cell::new(4, 3));
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let layout = Layout {
            starts: cells(&[(1, 1)]),
            defaults: cells(&[(2, 2)]),
        };
        let err = MotionCoordinator::from_layout(
            config(2),
            ObstacleField::new_open(5, 5),
            ScriptedSource::default(),
            layout,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            InitError::Config(ConfigError::LayoutMismatch { agents: 2, .. })
        ));
    }

    #[test]
    fn idle_barrier_waits_for_every_agent() {
        let mut c = three_agents();
        c.agents[0].budget = 50;
        c.agents[1].budget = 50;
        // (9,1) -> (1,18) is 25 unit steps, plus one tick to pop the goal
        c.agents[2].budget = 1;

        for tick in 1..26 {
            let snap = c.tick(PointerInput::idle());
            assert!(!snap.reshuffled, "reshuffled on tick {}", tick);
            assert_eq!(snap.active, 1);
            assert_eq!(snap.state, SessionState::IdleMoving);
        }
        let snap = c.tick(PointerInput::idle());
        assert!(snap.reshuffled);
        assert_eq!(snap.positions[2], Cell::new(1, 18));
    }

    #[test]
    fn reshuffle_is_a_permutation_of_previous_defaults() {
        let mut c = three_agents();
        let before_current = c.pool().current().to_vec();
        let mut before_previous = c.pool().previous().to_vec();

        let snap = run_until_settled(&mut c, 100);
        assert_eq!(snap.state, SessionState::IdleMoving);

        let mut new_targets: Vec<Cell> = c.agents().iter().map(|a| a.target).collect();
        new_targets.sort_by_key(|t| (t.x, t.y));
        before_previous.sort_by_key(|t| (t.x, t.y));
        assert_eq!(new_targets, before_previous);
        assert_eq!(c.pool().previous(), before_current.as_slice());
        for agent in c.agents() {
            assert!((2..=6).contains(&agent.budget));
        }
    }

    #[test]
    fn idle_steps_never_exceed_budget() {
        let mut c = three_agents();
        for _ in 0..60 {
            let before: Vec<(Cell, u32)> = c.agents().iter().map(|a| (a.position, a.budget)).collect();
            let snap = c.tick(PointerInput::idle());
            for ((pos, budget), after) in before.iter().zip(&snap.positions) {
                assert!(l1_distance(*pos, *after) <= *budget);
            }
        }
    }

    #[test]
    fn engaged_ticks_retarget_every_agent_each_tick() {
        let mut c = three_agents();
        let calls_before = c.source().calls.len();
        for _ in 0..4 {
            let before = c.positions();
            let snap = c.tick(PointerInput::engaged_at(10, 10));
            assert_eq!(snap.state, SessionState::Engaged);
            assert!(!snap.reshuffled);
            for (a, b) in before.iter().zip(&snap.positions) {
                assert!(l1_distance(*a, *b) <= 10);
            }
        }
        assert_eq!(c.source().calls.len(), calls_before + 4 * 3);
        for agent in c.agents() {
            let d = agent.target.as_vec2().distance(glam::Vec2::new(10.0, 10.0));
            assert!((d - 4.0).abs() <= 1.0, "target {:?} off the orbit", agent.target);
        }
    }

    #[test]
    fn engaged_agents_hold_position_without_reshuffling() {
        let mut c = three_agents();
        let previous = c.pool().previous().to_vec();
        for _ in 0..50 {
            c.tick(PointerInput::engaged_at(10, 10));
        }
        // every agent has long since reached its slot; idle pool untouched
        assert_eq!(c.pool().previous(), previous.as_slice());
    }

    #[test]
    fn release_resets_to_unshuffled_defaults() {
        let mut c = three_agents();
        let defaults = c.pool().current().to_vec();
        for _ in 0..5 {
            c.tick(PointerInput::engaged_at(10, 10));
        }
        let snap = c.tick(PointerInput::idle());
        assert_eq!(snap.state, SessionState::Reset);
        assert_eq!(c.pool().current(), defaults.as_slice());
        for (agent, goal) in c.agents().iter().zip(&defaults) {
            assert_eq!(agent.target, *goal);
        }
        let next = c.tick(PointerInput::idle());
        assert_eq!(next.state, SessionState::IdleMoving);
    }

    #[test]
    fn failed_search_keeps_stale_path() {
        let mut c = three_agents();
        let stale = c.agents()[0].path.clone();
        let first_default = c.pool().current()[0];
        c.source_mut().unreachable.push(first_default);
        c.plan_to_defaults();
        assert_eq!(c.agents()[0].path, stale);
        assert_eq!(c.failed_searches, 1);
    }

    #[test]
    fn unreachable_targets_leave_agents_parked() {
        let mut c = three_agents();
        let all: Vec<Cell> = c.pool().current().iter().chain(c.pool().previous()).copied().collect();
        c.source_mut().unreachable.extend(all);
        for agent in &mut c.agents {
            agent.path.clear();
        }
        let parked = c.positions();
        let snap = c.tick(PointerInput::idle());
        assert!(snap.reshuffled);
        assert_eq!(snap.state, SessionState::IdleSettled);
        assert_eq!(snap.positions, parked);
    }

    #[test]
    fn settles_through_a_maze_with_the_grid_planner() {
        let mask = ObstacleMask::from_ascii(&[
            "..............................",
            "..............................",
            "..............................",
            "#########################.....",
            "..............................",
            "..............................",
            ".....#########################",
            "..............................",
            "..............................",
            "..............................",
        ])
        .unwrap();
        let cfg = SwarmConfig {
            agent_count: 4,
            inflate_radius: 0,
            seed: Some(3),
            ..Default::default()
        };
        let mut c = MotionCoordinator::from_mask(cfg, &mask, GridPlanner::new()).unwrap();
        let defaults = c.pool().current().to_vec();
        assert!(c.agents().iter().all(|a| a.is_moving()));

        let snap = run_until_settled(&mut c, 500);
        // the first reshuffle fires only after everyone reached a default
        assert_eq!(snap.positions, defaults);
        assert_eq!(c.source().searches, 8);
        for agent in c.agents() {
            assert!(c.field().is_walkable(agent.position));
        }
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = MotionCoordinator::from_mask(config(2), &ObstacleMask::new(0, 0), GridPlanner::new())
            .err()
            .unwrap();
        assert!(matches!(err, InitError::Grid(GridError::ShapeMismatch(_))));

        let mut c = three_agents();
        let before = c.positions();
        assert!(matches!(
            c.rebuild(&ObstacleMask::new(12, 0)),
            Err(InitError::Grid(GridError::ShapeMismatch(_)))
        ));
        assert_eq!(c.field().bounds(), Bounds::new(20, 20));
        assert_eq!(c.positions(), before);
    }

    #[test]
    fn rebuild_restarts_the_session() {
        let mut c = MotionCoordinator::new(config(3), ObstacleField::new_open(30, 30), GridPlanner::new())
            .unwrap();
        for _ in 0..3 {
            c.tick(PointerInput::engaged_at(15, 15));
        }
        c.rebuild(&ObstacleMask::new(60, 40)).unwrap();
        assert_eq!(c.field().bounds(), Bounds::new(60, 40));
        assert_eq!(c.state(), SessionState::IdleMoving);
        assert_eq!(c.positions(), Layout::line(Bounds::new(60, 40), 3).starts);
    }
}
