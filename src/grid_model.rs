use crate::{error::GridError, neumann_neighborhood, FxIndexSet, Position};
use core::fmt;
use grid_util::grid::{BoolGrid, Grid};
use grid_util::point::Point;
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use rand::Rng;
use std::sync::Arc;

/// The static obstacles of a grid. Keeps the obstacle positions in insertion order together with
/// a [BoolGrid] occupancy mask so membership checks are a single lookup.
#[derive(Clone, Debug)]
pub struct ObstacleSet {
    width: i32,
    height: i32,
    mask: BoolGrid,
    cells: FxIndexSet<Position>,
}

impl ObstacleSet {
    fn empty(width: i32, height: i32) -> ObstacleSet {
        ObstacleSet {
            width,
            height,
            mask: BoolGrid::new(width as usize, height as usize, false),
            cells: FxIndexSet::default(),
        }
    }
    /// Inserts an in-bounds position, returning [false] if it was already present.
    fn insert(&mut self, pos: Position) -> bool {
        debug_assert!(self.in_bounds(&pos));
        if self.cells.insert(pos) {
            self.mask.set_point(pos, true);
            true
        } else {
            false
        }
    }
    pub fn in_bounds(&self, pos: &Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }
    /// Out of bounds positions are never obstacles.
    pub fn contains(&self, pos: &Position) -> bool {
        self.in_bounds(pos) && self.mask.get_point(*pos)
    }
    /// A cell an agent may stand on: in bounds and not an obstacle.
    pub fn is_free(&self, pos: &Position) -> bool {
        self.in_bounds(pos) && !self.mask.get_point(*pos)
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.cells.iter()
    }
    pub fn width(&self) -> usize {
        self.width as usize
    }
    pub fn height(&self) -> usize {
        self.height as usize
    }
}

impl PartialEq for ObstacleSet {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}
impl Eq for ObstacleSet {}

/// A read-only snapshot of the world as seen by the agent. The obstacle set is immutable once a
/// grid is built, so sharing it keeps the snapshot independent of later moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Perception {
    pub agent: Position,
    pub goal: Position,
    pub obstacles: Arc<ObstacleSet>,
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub perception: Perception,
}

/// [GridModel] stores the obstacles, the goal and the current agent position. It never checks
/// moves; deciding which moves are legal is left to the planners.
#[derive(Clone, Debug)]
pub struct GridModel {
    obstacles: Arc<ObstacleSet>,
    start: Position,
    goal: Position,
    agent: Position,
    components: UnionFind<usize>,
    components_dirty: bool,
}

fn checked_dimensions(width: usize, height: usize) -> Result<(i32, i32), GridError> {
    if width == 0 || height < 2 {
        return Err(GridError::InvalidConfiguration(format!(
            "grid must be at least 1x2 so start and goal differ, got {width}x{height}"
        )));
    }
    let w = i32::try_from(width).map_err(|_| {
        GridError::InvalidConfiguration(format!("grid width {width} does not fit in i32"))
    })?;
    let h = i32::try_from(height).map_err(|_| {
        GridError::InvalidConfiguration(format!("grid height {height} does not fit in i32"))
    })?;
    w.checked_mul(h).ok_or_else(|| {
        GridError::InvalidConfiguration(format!("grid {width}x{height} has too many cells"))
    })?;
    Ok((w, h))
}

impl GridModel {
    fn with_obstacles(obstacles: ObstacleSet) -> GridModel {
        let start = Point::new(obstacles.width / 2, 0);
        let goal = Point::new(obstacles.width / 2, obstacles.height - 1);
        let cell_count = obstacles.width() * obstacles.height();
        GridModel {
            obstacles: Arc::new(obstacles),
            start,
            goal,
            agent: start,
            components: UnionFind::new(cell_count),
            components_dirty: true,
        }
    }

    /// Builds a grid with `obstacle_count` obstacles sampled uniformly with `rng`. Samples that
    /// land on the start, the goal or an existing obstacle are rejected and redrawn.
    ///
    /// Fails with [GridError::InvalidConfiguration] if the grid is degenerate or if there are
    /// fewer than `obstacle_count` cells besides the start and goal.
    pub fn new<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        obstacle_count: usize,
        rng: &mut R,
    ) -> Result<GridModel, GridError> {
        let (w, h) = checked_dimensions(width, height)?;
        let free_cells = width * height - 2;
        if obstacle_count > free_cells {
            return Err(GridError::InvalidConfiguration(format!(
                "{obstacle_count} obstacles requested but a {width}x{height} grid only has {free_cells} free cells"
            )));
        }
        let start = Point::new(w / 2, 0);
        let goal = Point::new(w / 2, h - 1);
        let mut obstacles = ObstacleSet::empty(w, h);
        let mut rejected = 0_usize;
        while obstacles.len() < obstacle_count {
            let p = Point::new(rng.gen_range(0..w), rng.gen_range(0..h));
            if p == start || p == goal || !obstacles.insert(p) {
                rejected += 1;
            }
        }
        info!(
            "Placed {} obstacles on a {}x{} grid ({} samples rejected)",
            obstacle_count, width, height, rejected
        );
        Ok(GridModel::with_obstacles(obstacles))
    }

    /// Builds a grid with a fixed obstacle layout. Duplicate positions are collapsed.
    pub fn from_obstacles<I>(width: usize, height: usize, obstacles: I) -> Result<GridModel, GridError>
    where
        I: IntoIterator<Item = Position>,
    {
        let (w, h) = checked_dimensions(width, height)?;
        let start = Point::new(w / 2, 0);
        let goal = Point::new(w / 2, h - 1);
        let mut set = ObstacleSet::empty(w, h);
        for p in obstacles {
            if !set.in_bounds(&p) {
                return Err(GridError::InvalidConfiguration(format!(
                    "obstacle {p} lies outside the {width}x{height} grid"
                )));
            }
            if p == start || p == goal {
                return Err(GridError::InvalidConfiguration(format!(
                    "obstacle {p} would cover the start or the goal"
                )));
            }
            set.insert(p);
        }
        Ok(GridModel::with_obstacles(set))
    }

    /// A grid without obstacles.
    pub fn open(width: usize, height: usize) -> Result<GridModel, GridError> {
        GridModel::from_obstacles(width, height, std::iter::empty::<Position>())
    }

    pub fn perceive(&self) -> Perception {
        Perception {
            agent: self.agent,
            goal: self.goal,
            obstacles: Arc::clone(&self.obstacles),
        }
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width(),
            height: self.height(),
            perception: self.perceive(),
        }
    }

    /// Stores the new agent position as is.
    pub fn move_agent_to(&mut self, position: Position) {
        self.agent = position;
    }

    pub fn width(&self) -> usize {
        self.obstacles.width()
    }
    pub fn height(&self) -> usize {
        self.obstacles.height()
    }
    pub fn start(&self) -> Position {
        self.start
    }
    pub fn goal(&self) -> Position {
        self.goal
    }
    pub fn agent(&self) -> Position {
        self.agent
    }
    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }
    pub fn in_bounds(&self, pos: &Position) -> bool {
        self.obstacles.in_bounds(pos)
    }
    pub fn is_obstacle(&self, pos: &Position) -> bool {
        self.obstacles.contains(pos)
    }
    pub fn is_free(&self, pos: &Position) -> bool {
        self.obstacles.is_free(pos)
    }
    pub fn at_goal(&self) -> bool {
        self.agent == self.goal
    }

    fn get_ix_point(&self, point: &Position) -> usize {
        point.y as usize * self.width() + point.x as usize
    }

    /// Generates a new [UnionFind] structure and links up free 4-neighbours to the same
    /// components.
    pub fn generate_components(&mut self) {
        debug!("Generating connected components");
        let w = self.width();
        let h = self.height();
        let mut components = UnionFind::new(w * h);
        for x in 0..w as i32 {
            for y in 0..h as i32 {
                let point = Point::new(x, y);
                if !self.is_free(&point) {
                    continue;
                }
                let parent_ix = self.get_ix_point(&point);
                // Up and right are enough to cover every edge once
                for neighbour in [Point::new(x, y + 1), Point::new(x + 1, y)] {
                    if self.is_free(&neighbour) {
                        components.union(parent_ix, self.get_ix_point(&neighbour));
                    }
                }
            }
        }
        self.components = components;
        self.components_dirty = false;
    }

    /// Regenerates the components if they have not been generated yet.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Checks if `a` and `b` are free cells on the same 4-connected component. Requires
    /// [update](Self::update) or [generate_components](Self::generate_components) to have run.
    pub fn reachable(&self, a: &Position, b: &Position) -> bool {
        debug_assert!(!self.components_dirty, "components must be generated first");
        if self.is_free(a) && self.is_free(b) {
            self.components
                .equiv(self.get_ix_point(a), self.get_ix_point(b))
        } else {
            false
        }
    }

    /// Whether the goal can be reached from the current agent position at all.
    pub fn goal_reachable(&mut self) -> bool {
        self.update();
        let reachable = self.reachable(&self.agent, &self.goal);
        if !reachable {
            info!("{} is not reachable from {}", self.goal, self.agent);
        }
        reachable
    }

    /// Number of free neighbours of `pos`, used to spot an agent that is boxed in.
    pub fn free_neighbours(&self, pos: &Position) -> usize {
        neumann_neighborhood(pos)
            .iter()
            .filter(|p| self.is_free(p))
            .count()
    }
}

impl GridSnapshot {
    fn cell_char(&self, p: Position) -> char {
        let perception = &self.perception;
        if p == perception.agent {
            'A'
        } else if p == perception.goal {
            'G'
        } else if perception.obstacles.contains(&p) {
            '#'
        } else {
            '.'
        }
    }
}

/// One line per row starting at `y = 0`, so the start row comes first and the goal row last.
impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height as i32 {
            let row = (0..self.width as i32)
                .map(|x| self.cell_char(Point::new(x, y)))
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

impl fmt::Display for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.snapshot(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn start_and_goal_are_centered() {
        let mut rng = StdRng::seed_from_u64(0);
        let grid = GridModel::new(50, 30, 150, &mut rng).unwrap();
        assert_eq!(grid.start(), Point::new(25, 0));
        assert_eq!(grid.goal(), Point::new(25, 29));
        assert_eq!(grid.agent(), grid.start());
        assert_eq!(grid.obstacles().len(), 150);
        assert!(!grid.is_obstacle(&grid.start()));
        assert!(!grid.is_obstacle(&grid.goal()));
    }

    #[test]
    fn fills_every_free_cell() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = GridModel::new(3, 3, 7, &mut rng).unwrap();
        assert_eq!(grid.obstacles().len(), 7);
        assert_eq!(grid.free_neighbours(&grid.start()), 0);
    }

    #[test]
    fn rejects_too_many_obstacles() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = GridModel::new(3, 3, 8, &mut rng).unwrap_err();
        assert!(matches!(err, GridError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_degenerate_grid() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(GridModel::new(5, 1, 0, &mut rng).is_err());
        assert!(GridModel::new(0, 5, 0, &mut rng).is_err());
    }

    #[test]
    fn fixed_layout_validation() {
        assert!(GridModel::from_obstacles(5, 5, [Point::new(2, 0)]).is_err());
        assert!(GridModel::from_obstacles(5, 5, [Point::new(2, 4)]).is_err());
        assert!(GridModel::from_obstacles(5, 5, [Point::new(5, 1)]).is_err());
        let grid =
            GridModel::from_obstacles(5, 5, [Point::new(1, 1), Point::new(1, 1)]).unwrap();
        assert_eq!(grid.obstacles().len(), 1);
    }

    #[test]
    fn perceive_is_idempotent_and_detached() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut grid = GridModel::new(10, 10, 20, &mut rng).unwrap();
        let first = grid.perceive();
        assert_eq!(first, grid.perceive());
        grid.move_agent_to(Point::new(0, 0));
        assert_eq!(first.agent, Point::new(5, 0));
        assert_eq!(grid.perceive().agent, Point::new(0, 0));
    }

    #[test]
    fn move_agent_is_unchecked() {
        let mut grid = GridModel::from_obstacles(5, 5, [Point::new(1, 1)]).unwrap();
        grid.move_agent_to(Point::new(1, 1));
        assert_eq!(grid.agent(), Point::new(1, 1));
    }

    /// Corresponds to the following grid, printed from `y = 0` down to the goal row:
    ///  _____
    /// |..A..|
    /// |#####|
    /// |..G..|
    ///  _____
    #[test]
    fn wall_separates_components() {
        let wall = (0..5).map(|x| Point::new(x, 1));
        let mut grid = GridModel::from_obstacles(5, 3, wall).unwrap();
        assert!(!grid.goal_reachable());
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(4, 0)));
        assert!(!grid.reachable(&Point::new(0, 0), &Point::new(1, 1)));
    }

    #[test]
    fn opening_connects_components() {
        let wall = (1..5).map(|x| Point::new(x, 1));
        let mut grid = GridModel::from_obstacles(5, 3, wall).unwrap();
        assert!(grid.goal_reachable());
    }

    #[test]
    fn display_marks_cells() {
        let grid = GridModel::from_obstacles(3, 2, [Point::new(0, 1)]).unwrap();
        assert_eq!(grid.to_string(), ".A.\n#G.\n");
    }

    /// The start row is printed first, the goal row last, and the snapshot renders the same
    /// frame as the grid it was taken from.
    #[test]
    fn display_starts_at_bottom_row() {
        let mut grid = GridModel::from_obstacles(3, 3, [Point::new(2, 1)]).unwrap();
        grid.move_agent_to(Point::new(0, 1));
        let frame = grid.snapshot().to_string();
        assert_eq!(frame, "...\nA.#\n.G.\n");
        assert_eq!(frame, grid.to_string());
        assert_eq!(frame.lines().last(), Some(".G."));
    }

    /// Obstacles at every corner of the mask, which exercises both ends of the occupancy lookup.
    #[test]
    fn occupancy_mask_matches_obstacle_set() {
        let corners = [
            Point::new(0, 0),
            Point::new(3, 0),
            Point::new(0, 4),
            Point::new(3, 4),
        ];
        let grid = GridModel::from_obstacles(4, 5, corners).unwrap();
        for y in 0..5 {
            for x in 0..4 {
                let p = Point::new(x, y);
                assert_eq!(grid.is_obstacle(&p), corners.contains(&p));
                assert_eq!(grid.is_free(&p), !corners.contains(&p));
            }
        }
        assert!(!grid.is_obstacle(&Point::new(-1, 0)));
        assert!(!grid.is_free(&Point::new(4, 0)));
        assert!(!grid.is_free(&Point::new(0, 5)));
    }
}
