use crate::{agent::AgentState, neumann_neighborhood, planner::Planner, Perception, Position};
use log::debug;

/// Moves to the unvisited free neighbour closest to the goal. It only looks one step ahead, so
/// it relies on the agent's history to avoid walking in circles and can dead-end in cul-de-sacs.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyPlanner;

impl Planner for GreedyPlanner {
    fn next_position(&mut self, perception: &Perception, agent: &AgentState) -> Position {
        let current = perception.agent;
        let goal = perception.goal;
        // min_by_key keeps the first minimum, which gives the up, right, down, left tie-break
        let next = neumann_neighborhood(&current)
            .into_iter()
            .filter(|p| perception.obstacles.is_free(p) && !agent.visited(p))
            .min_by_key(|p| self.heuristic(p, &goal));
        match next {
            Some(p) => p,
            None => {
                debug!("No unvisited free neighbour around {}", current);
                current
            }
        }
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridModel;
    use grid_util::point::Point;

    fn walk(grid: &mut GridModel, max_steps: usize) -> Vec<Position> {
        let mut agent = AgentState::new(grid.agent());
        let mut planner = GreedyPlanner;
        let mut path = vec![grid.agent()];
        for _ in 0..max_steps {
            let next = planner.next_position(&grid.perceive(), &agent);
            agent.advance(next);
            grid.move_agent_to(next);
            path.push(next);
            if grid.at_goal() {
                break;
            }
        }
        path
    }

    #[test]
    fn walks_straight_without_obstacles() {
        let mut grid = GridModel::open(5, 5).unwrap();
        let path = walk(&mut grid, 10);
        assert_eq!(
            path,
            (0..5).map(|y| Point::new(2, y)).collect::<Vec<_>>()
        );
    }

    /// With the goal straight ahead blocked, right and left are equally close; right comes first.
    #[test]
    fn ties_prefer_right_over_left() {
        let grid = GridModel::from_obstacles(5, 5, [Point::new(2, 1)]).unwrap();
        let agent = AgentState::new(grid.agent());
        let next = GreedyPlanner.next_position(&grid.perceive(), &agent);
        assert_eq!(next, Point::new(3, 0));
    }

    #[test]
    fn skips_visited_cells() {
        let grid = GridModel::open(5, 5).unwrap();
        let mut agent = AgentState::new(Point::new(2, 2));
        agent.advance(Point::new(2, 1));
        // (2, 2) is now in the history, the closest remaining move is to the right
        let mut perception = grid.perceive();
        perception.agent = agent.position();
        assert_eq!(
            GreedyPlanner.next_position(&perception, &agent),
            Point::new(3, 1)
        );
    }

    #[test]
    fn stuck_when_all_neighbours_visited() {
        let grid = GridModel::open(3, 2).unwrap();
        let mut agent = AgentState::new(Point::new(0, 0));
        agent.advance(Point::new(0, 1));
        agent.advance(Point::new(1, 1));
        agent.advance(Point::new(1, 0));
        agent.advance(Point::new(2, 0));
        agent.advance(Point::new(2, 1));
        // (2, 1) sits in a corner and both of its free neighbours are in the history
        let mut perception = grid.perceive();
        perception.agent = agent.position();
        assert_eq!(
            GreedyPlanner.next_position(&perception, &agent),
            Point::new(2, 1)
        );
    }
}
