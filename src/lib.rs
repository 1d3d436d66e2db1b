//! # grid_agent
//!
//! Simulates an agent crossing a 4-connected grid from a start cell on the bottom row
//! `(width / 2, 0)` to a goal cell on the top row `(width / 2, height - 1)` while
//! avoiding randomly placed static obstacles. Every step the agent perceives the grid,
//! a [Planner](planner::Planner) picks the next cell and the [GridModel] stores it.
//!
//! Two planners are provided:
//! - [GreedyPlanner](planner::greedy::GreedyPlanner), a one-step Manhattan heuristic that
//!   remembers visited cells to avoid cycles and can dead-end in cul-de-sacs.
//! - [AstarPlanner](planner::astar::AstarPlanner), which re-plans a shortest path with
//!   [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) from the current position
//!   every step and returns its first move.
//!
//! Rendering and pacing are left to a [StepObserver](simulation::StepObserver).
pub mod agent;
pub mod astar;
pub mod config;
pub mod error;
pub mod grid_model;
pub mod planner;
pub mod simulation;

use grid_util::point::Point;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use smallvec::SmallVec;

pub use agent::AgentState;
pub use config::SimulationConfig;
pub use error::{ConfigError, GridError, SimulationError};
pub use grid_model::{GridModel, GridSnapshot, ObstacleSet, Perception};
pub use simulation::{Outcome, Phase, Simulation};

/// A cell on the grid. Valid positions satisfy `0 <= x < width` and `0 <= y < height`.
pub type Position = Point;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, fxhash::FxBuildHasher>;
pub(crate) type FxIndexSet<K> = IndexSet<K, fxhash::FxBuildHasher>;

/// Cost of a single cardinal move.
pub const C: i32 = 1;

pub const N_SMALLVEC_SIZE: usize = 4;

/// Neighbour offsets in expansion order: up, right, down, left. Ties between equally
/// good moves are always resolved in this order.
pub const MOVE_ORDER: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// The 4-connected neighbourhood of `p` in [MOVE_ORDER], without bounds checks.
pub fn neumann_neighborhood(p: &Position) -> SmallVec<[Position; N_SMALLVEC_SIZE]> {
    MOVE_ORDER
        .iter()
        .map(|&(dx, dy)| Point::new(p.x + dx, p.y + dy))
        .collect()
}

/// [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) between two cells.
pub fn manhattan(p1: &Position, p2: &Position) -> i32 {
    (p1.x - p2.x).abs() + (p1.y - p2.y).abs()
}

/// Whether every consecutive pair in `path` is one cardinal step apart.
pub fn is_connected_path(path: &[Position]) -> bool {
    path.iter()
        .tuple_windows()
        .all(|(a, b)| manhattan(a, b) == C)
}
