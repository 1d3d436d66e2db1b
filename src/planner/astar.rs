use std::collections::VecDeque;

use crate::{
    agent::AgentState,
    astar::astar,
    is_connected_path, manhattan,
    planner::{neighborhood_points_and_cost, Planner},
    Perception, Position, C,
};
use log::{debug, trace};
use serde::Deserialize;

/// How often the A* planner searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    /// Searches from scratch on every call.
    #[default]
    Replan,
    /// Follows the last computed path for as long as the agent is where the path expects it to
    /// be, and searches again otherwise.
    Cached,
}

#[derive(Clone, Debug)]
pub struct AstarPlanner {
    pub heuristic_factor: f32,
    pub mode: PlanMode,
    /// Remaining steps of the last plan, front is the expected current position.
    cached: VecDeque<Position>,
    searches: usize,
}

impl Default for AstarPlanner {
    fn default() -> AstarPlanner {
        AstarPlanner::new()
    }
}

impl AstarPlanner {
    pub fn new() -> AstarPlanner {
        AstarPlanner {
            heuristic_factor: 1.0,
            mode: PlanMode::Replan,
            cached: VecDeque::new(),
            searches: 0,
        }
    }
    pub fn with_mode(mut self, mode: PlanMode) -> AstarPlanner {
        self.mode = mode;
        self
    }
    /// Scales the heuristic. Factors above 1.0 trade optimality for fewer expansions.
    pub fn with_heuristic_factor(mut self, heuristic_factor: f32) -> AstarPlanner {
        self.heuristic_factor = heuristic_factor;
        self
    }
    /// Number of searches run so far.
    pub fn searches(&self) -> usize {
        self.searches
    }

    /// Computes a shortest path from the agent to the goal, including both endpoints.
    pub fn shortest_path(&self, perception: &Perception) -> Option<Vec<Position>> {
        let goal = perception.goal;
        let obstacles = &perception.obstacles;
        if !obstacles.is_free(&perception.agent) || !obstacles.is_free(&goal) {
            debug!("{} or {} is not a free cell", perception.agent, goal);
            return None;
        }
        astar(
            &perception.agent,
            |node| neighborhood_points_and_cost(obstacles, node),
            |point| self.heuristic(point, &goal),
            |point| *point == goal,
        )
        .map(|(path, _cost)| path)
    }

    fn plan(&mut self, perception: &Perception) -> Position {
        self.searches += 1;
        match self.shortest_path(perception) {
            Some(path) => {
                debug_assert!(is_connected_path(&path));
                trace!("Planned {} steps from {}", path.len() - 1, perception.agent);
                let next = path.get(1).copied().unwrap_or(perception.agent);
                if self.mode == PlanMode::Cached {
                    self.cached = path.into_iter().skip(1).collect();
                }
                next
            }
            None => {
                debug!("{} is not reachable from {}", perception.goal, perception.agent);
                self.cached.clear();
                perception.agent
            }
        }
    }

    /// Pops the next step of the cached plan if the agent followed it so far.
    fn follow_cached(&mut self, perception: &Perception) -> Option<Position> {
        if self.cached.front() != Some(&perception.agent) {
            return None;
        }
        self.cached.pop_front();
        self.cached
            .front()
            .copied()
            .filter(|p| perception.obstacles.is_free(p))
    }
}

impl Planner for AstarPlanner {
    fn next_position(&mut self, perception: &Perception, _agent: &AgentState) -> Position {
        if perception.agent == perception.goal {
            return perception.agent;
        }
        if self.mode == PlanMode::Cached {
            if let Some(next) = self.follow_cached(perception) {
                return next;
            }
        }
        self.plan(perception)
    }

    fn name(&self) -> &'static str {
        "astar"
    }

    /// Manhattan distance times the heuristic factor.
    fn heuristic(&self, p: &Position, goal: &Position) -> i32 {
        ((manhattan(p, goal) * C) as f32 * self.heuristic_factor) as i32
    }
}
