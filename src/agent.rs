use crate::Position;
use fxhash::FxHashSet;

/// The agent's own state: where it stands and every cell it has stood on before.
#[derive(Clone, Debug)]
pub struct AgentState {
    position: Position,
    history: FxHashSet<Position>,
}

impl AgentState {
    /// Starts at `position`, which is also the first entry of the history.
    pub fn new(position: Position) -> AgentState {
        let mut history = FxHashSet::default();
        history.insert(position);
        AgentState { position, history }
    }
    pub fn position(&self) -> Position {
        self.position
    }
    pub fn history(&self) -> &FxHashSet<Position> {
        &self.history
    }
    pub fn visited(&self, pos: &Position) -> bool {
        self.history.contains(pos)
    }
    /// Records the current position in the history and moves to `new_position`.
    pub fn advance(&mut self, new_position: Position) {
        self.history.insert(self.position);
        self.position = new_position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_util::point::Point;

    #[test]
    fn advance_grows_history() {
        let mut agent = AgentState::new(Point::new(2, 0));
        assert!(agent.visited(&Point::new(2, 0)));
        agent.advance(Point::new(2, 1));
        agent.advance(Point::new(3, 1));
        assert_eq!(agent.position(), Point::new(3, 1));
        assert!(agent.visited(&Point::new(2, 1)));
        // The current cell only enters the history once the agent leaves it
        assert!(!agent.visited(&Point::new(3, 1)));
        assert_eq!(agent.history().len(), 2);
    }

    #[test]
    fn standing_still_keeps_history() {
        let mut agent = AgentState::new(Point::new(0, 0));
        agent.advance(Point::new(0, 0));
        assert_eq!(agent.history().len(), 1);
    }
}
