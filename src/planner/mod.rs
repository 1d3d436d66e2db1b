use crate::{
    agent::AgentState, grid_model::ObstacleSet, manhattan, neumann_neighborhood, Perception,
    Position, C, N_SMALLVEC_SIZE,
};
use serde::Deserialize;
use smallvec::SmallVec;

pub mod astar;
pub mod greedy;

use self::astar::{AstarPlanner, PlanMode};
use self::greedy::GreedyPlanner;

/// Picks the next cell for the agent. Returning the agent's current position means no progress
/// could be made, either because every move is blocked or because the goal is unreachable.
pub trait Planner {
    fn next_position(&mut self, perception: &Perception, agent: &AgentState) -> Position;

    fn name(&self) -> &'static str;

    /// Manhattan distance, admissible and consistent on a 4-connected unit cost grid.
    fn heuristic(&self, p: &Position, goal: &Position) -> i32 {
        manhattan(p, goal) * C
    }
}

impl<P: Planner + ?Sized> Planner for Box<P> {
    fn next_position(&mut self, perception: &Perception, agent: &AgentState) -> Position {
        (**self).next_position(perception, agent)
    }
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn heuristic(&self, p: &Position, goal: &Position) -> i32 {
        (**self).heuristic(p, goal)
    }
}

/// Free 4-neighbours of `pos` with their move cost, in up, right, down, left order.
pub fn neighborhood_points_and_cost(
    obstacles: &ObstacleSet,
    pos: &Position,
) -> SmallVec<[(Position, i32); N_SMALLVEC_SIZE]> {
    neumann_neighborhood(pos)
        .into_iter()
        .filter(|p| obstacles.is_free(p))
        .map(|p| (p, C))
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    Greedy,
    #[default]
    Astar,
}

impl PlannerKind {
    pub fn build(self, mode: PlanMode, heuristic_factor: f32) -> Box<dyn Planner> {
        match self {
            PlannerKind::Greedy => Box::new(GreedyPlanner),
            PlannerKind::Astar => Box::new(
                AstarPlanner::new()
                    .with_mode(mode)
                    .with_heuristic_factor(heuristic_factor),
            ),
        }
    }
}
