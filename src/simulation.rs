use crate::{
    agent::AgentState,
    config::SimulationConfig,
    error::SimulationError,
    grid_model::{GridModel, GridSnapshot},
    planner::Planner,
};
use log::{debug, info, warn};
use rand::Rng;

/// Where a [Simulation] is in its perceive, plan, move cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Planning,
    Moved,
    GoalReached,
    BudgetExhausted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::GoalReached | Phase::BudgetExhausted)
    }
}

/// How a run ended. `steps` counts moves, including moves that made no progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    GoalReached { steps: usize },
    BudgetExhausted { steps: usize },
}

impl Outcome {
    pub fn steps(&self) -> usize {
        match *self {
            Outcome::GoalReached { steps } | Outcome::BudgetExhausted { steps } => steps,
        }
    }
    pub fn reached_goal(&self) -> bool {
        matches!(self, Outcome::GoalReached { .. })
    }
}

/// Hooks for collaborators that only consume the state of a run, such as a renderer or something
/// that paces the steps.
pub trait StepObserver {
    fn on_start(&mut self, _snapshot: &GridSnapshot) {}
    fn on_step(&mut self, _step: usize, _snapshot: &GridSnapshot) {}
    fn on_finish(&mut self, _outcome: &Outcome) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Runs one agent on one grid. The grid and the agent are owned here and only change between
/// steps.
pub struct Simulation<P: Planner> {
    grid: GridModel,
    agent: AgentState,
    planner: P,
    max_steps: usize,
    steps: usize,
    phase: Phase,
    require_reachable_goal: bool,
}

impl<P: Planner> Simulation<P> {
    pub fn new(grid: GridModel, planner: P, max_steps: usize) -> Simulation<P> {
        let agent = AgentState::new(grid.agent());
        Simulation {
            grid,
            agent,
            planner,
            max_steps,
            steps: 0,
            phase: Phase::Idle,
            require_reachable_goal: false,
        }
    }

    /// Makes [run](Self::run) fail with [SimulationError::GoalUnreachable] up front instead of
    /// spending the step budget on a goal it can never reach.
    pub fn require_reachable_goal(mut self, require: bool) -> Simulation<P> {
        self.require_reachable_goal = require;
        self
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }
    pub fn agent(&self) -> &AgentState {
        &self.agent
    }
    pub fn planner(&self) -> &P {
        &self.planner
    }
    pub fn steps(&self) -> usize {
        self.steps
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::GoalReached => Some(Outcome::GoalReached { steps: self.steps }),
            Phase::BudgetExhausted => Some(Outcome::BudgetExhausted { steps: self.steps }),
            _ => None,
        }
    }

    /// Performs one perceive, plan, move cycle and returns the resulting phase. Does nothing once
    /// the run has ended.
    pub fn step(&mut self) -> Phase {
        if self.phase.is_terminal() {
            return self.phase;
        }
        if self.grid.at_goal() {
            self.phase = Phase::GoalReached;
            return self.phase;
        }
        if self.steps >= self.max_steps {
            self.phase = Phase::BudgetExhausted;
            return self.phase;
        }
        self.phase = Phase::Planning;
        let perception = self.grid.perceive();
        let next = self.planner.next_position(&perception, &self.agent);
        if next == perception.agent {
            if self.grid.free_neighbours(&next) == 0 {
                debug!("Step {}: agent is boxed in at {}", self.steps + 1, next);
            } else {
                debug!(
                    "Step {}: {} planner made no progress at {}",
                    self.steps + 1,
                    self.planner.name(),
                    next
                );
            }
        }
        self.agent.advance(next);
        self.grid.move_agent_to(next);
        self.steps += 1;
        self.phase = Phase::Moved;

        if self.grid.at_goal() {
            self.phase = Phase::GoalReached;
        } else if self.steps >= self.max_steps {
            self.phase = Phase::BudgetExhausted;
        }
        self.phase
    }

    /// Steps until the goal is reached or the step budget is used up, reporting every frame to
    /// `observer`.
    pub fn run<O: StepObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<Outcome, SimulationError> {
        if self.require_reachable_goal && !self.grid.goal_reachable() {
            return Err(SimulationError::GoalUnreachable {
                start: self.grid.agent(),
                goal: self.grid.goal(),
            });
        }
        observer.on_start(&self.grid.snapshot());
        loop {
            if let Some(outcome) = self.outcome() {
                match outcome {
                    Outcome::GoalReached { steps } => {
                        info!("Goal reached in {} steps by {} planner", steps, self.planner.name())
                    }
                    Outcome::BudgetExhausted { steps } => {
                        warn!("Goal not reached within {} steps", steps)
                    }
                }
                observer.on_finish(&outcome);
                return Ok(outcome);
            }
            let before = self.steps;
            self.step();
            if self.steps > before {
                observer.on_step(self.steps, &self.grid.snapshot());
            }
        }
    }
}

impl Simulation<Box<dyn Planner>> {
    /// Builds the grid and the planner described by `config`.
    pub fn from_config<R: Rng + ?Sized>(
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<Simulation<Box<dyn Planner>>, SimulationError> {
        config.validate()?;
        let grid = GridModel::new(config.width, config.height, config.obstacle_count, rng)?;
        let planner = config.planner.build(config.mode, config.heuristic_factor);
        Ok(Simulation::new(grid, planner, config.max_steps)
            .require_reachable_goal(config.require_reachable_goal))
    }
}
