use core::fmt;

use grid_util::{BoolGrid, Direction, Point, Rect, ValueGrid};
use itertools::iproduct;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

use crate::error::{PathfindingError, Result};
use crate::point::{cell_rect, directions, step_length};
use crate::N_SMALLVEC_SIZE;

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Free,
    Obstacle,
}

impl Cell {
    pub fn is_free(self) -> bool {
        self == Cell::Free
    }

    fn blocked(self) -> bool {
        self == Cell::Obstacle
    }
}

impl From<bool> for Cell {
    /// `true` marks an obstacle, as in the underlying [BoolGrid].
    fn from(blocked: bool) -> Cell {
        if blocked {
            Cell::Obstacle
        } else {
            Cell::Free
        }
    }
}

/// Binary occupancy map, a [Cell] view over a packed [BoolGrid] in which `true` is blocked.
/// A grid is never mutated while a search borrows it, which the borrow checker enforces:
/// every search holds a shared reference.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: BoolGrid,
}

impl Grid {
    /// Builds a grid from row-major cell states.
    pub fn new(width: usize, height: usize, cells: Vec<Cell>) -> Result<Grid> {
        if width == 0 || height == 0 {
            return Err(PathfindingError::MalformedGrid(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if width > i32::MAX as usize || height > i32::MAX as usize {
            return Err(PathfindingError::MalformedGrid(format!(
                "dimensions {width}x{height} exceed the coordinate range"
            )));
        }
        if cells.len() != width * height {
            return Err(PathfindingError::MalformedGrid(format!(
                "expected {} cells for a {width}x{height} grid, got {}",
                width * height,
                cells.len()
            )));
        }
        let mut grid = Grid {
            cells: BoolGrid::new(width, height, false),
        };
        for (ix, cell) in cells.into_iter().enumerate() {
            if cell.blocked() {
                grid.set(grid.point_from_ix(ix), cell);
            }
        }
        Ok(grid)
    }

    pub fn filled(width: usize, height: usize, cell: Cell) -> Result<Grid> {
        Grid::new(width, height, vec![cell; width * height])
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Grid>
    where
        F: FnMut(Point) -> Cell,
    {
        let cells = iproduct!(0..height as i32, 0..width as i32)
            .map(|(y, x)| f(Point::new(x, y)))
            .collect();
        Grid::new(width, height, cells)
    }

    /// Parses a grid drawn with `#` for obstacles and `.`, `S` or `G` for free cells, one
    /// row per line. Surrounding whitespace on each line is ignored.
    pub fn from_ascii(map: &str) -> Result<Grid> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(PathfindingError::MalformedGrid(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for c in row.chars() {
                cells.push(match c {
                    '#' => Cell::Obstacle,
                    '.' | 'S' | 'G' => Cell::Free,
                    other => {
                        return Err(PathfindingError::MalformedGrid(format!(
                            "unexpected symbol {other:?} in row {y}"
                        )))
                    }
                });
            }
        }
        Grid::new(width, height, cells)
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.cells.index_in_bounds(x, y)
    }

    pub fn point_in_bounds(&self, point: Point) -> bool {
        self.cells.point_in_bounds(point)
    }

    fn assert_in_bounds(&self, point: Point) {
        assert!(
            self.point_in_bounds(point),
            "{point} is outside the {}x{} grid",
            self.width(),
            self.height()
        );
    }

    /// Row-major index of an in-bounds point.
    pub fn get_ix_point(&self, point: &Point) -> usize {
        self.assert_in_bounds(*point);
        self.cells.get_ix_point(point)
    }

    pub fn point_from_ix(&self, ix: usize) -> Point {
        Point::new((ix % self.width()) as i32, (ix / self.width()) as i32)
    }

    /// State of an in-bounds cell. Panics on out-of-range coordinates; use
    /// [try_cell](Self::try_cell) for coordinates that come from outside the engine.
    pub fn cell(&self, point: Point) -> Cell {
        self.assert_in_bounds(point);
        Cell::from(self.cells.get_point(point))
    }

    pub fn try_cell(&self, point: Point) -> Result<Cell> {
        if self.point_in_bounds(point) {
            Ok(Cell::from(self.cells.get_point(point)))
        } else {
            Err(self.out_of_bounds(point))
        }
    }

    pub fn set(&mut self, point: Point, cell: Cell) {
        self.assert_in_bounds(point);
        self.cells.set_point(point, cell.blocked());
    }

    /// Marks every cell of `rect` (corners inclusive) that lies inside the grid.
    pub fn set_rect(&mut self, rect: Rect, cell: Cell) {
        for point in rect.points_in() {
            if self.point_in_bounds(point) {
                self.cells.set_point(point, cell.blocked());
            }
        }
    }

    /// Out-of-range points count as blocked.
    pub fn can_move_to_simple(&self, pos: Point) -> bool {
        self.point_in_bounds(pos) && !self.cells.get_point(pos)
    }

    /// Whether a single step from `start` to the adjacent `pos` is legal. Diagonal steps also
    /// need both flanking cardinal cells to be free, so corners are never cut.
    pub fn can_move_to(&self, pos: Point, start: Point) -> bool {
        debug_assert!((start.x - pos.x).abs() <= 1 && (start.y - pos.y).abs() <= 1);
        self.can_move_to_simple(pos)
            && self.can_move_to_simple(Point::new(start.x, pos.y))
            && self.can_move_to_simple(Point::new(pos.x, start.y))
    }

    pub fn can_step(&self, from: Point, dir: Direction) -> bool {
        self.can_move_to(from + dir, from)
    }

    /// Legal moves out of `pos`, paired with their direction.
    pub fn legal_moves(&self, pos: Point) -> impl Iterator<Item = (Point, Direction)> + '_ {
        directions()
            .map(move |dir| (pos + dir, dir))
            .filter(move |&(p, _)| self.can_move_to(p, pos))
    }

    pub fn neighborhood_points_and_cost(
        &self,
        pos: &Point,
    ) -> SmallVec<[(Point, f64); N_SMALLVEC_SIZE]> {
        self.legal_moves(*pos)
            .map(|(p, dir)| (p, step_length(dir)))
            .collect()
    }

    /// Rejects out-of-range or blocked scenario endpoints.
    pub fn ensure_free(&self, point: Point, role: &'static str) -> Result<()> {
        match self.try_cell(point)? {
            Cell::Free => Ok(()),
            Cell::Obstacle => Err(PathfindingError::Blocked {
                role,
                x: point.x,
                y: point.y,
            }),
        }
    }

    pub fn free_cells(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len())
            .map(|ix| self.point_from_ix(ix))
            .filter(|&point| !self.cells.get_point(point))
    }

    fn out_of_bounds(&self, point: Point) -> PathfindingError {
        PathfindingError::OutOfBounds {
            x: point.x,
            y: point.y,
            width: self.width(),
            height: self.height(),
        }
    }

    /// Generates a [UnionFind] structure linking up every pair of cells joined by a legal
    /// move. Only the forward half of the neighbourhood is visited since moves are symmetric.
    pub fn components(&self) -> Components {
        let mut components = UnionFind::new(self.len());
        for point in self.free_cells() {
            let parent_ix = self.get_ix_point(&point);
            for (dx, dy) in FORWARD_OFFSETS {
                let next = Point::new(point.x + dx, point.y + dy);
                if self.can_move_to(next, point) {
                    components.union(parent_ix, self.get_ix_point(&next));
                }
            }
        }
        info!(
            "Generated connected components for {}x{} grid",
            self.width(),
            self.height()
        );
        Components {
            bounds: cell_rect(0, 0, self.width() as i32, self.height() as i32),
            width: self.width(),
            components,
        }
    }
}

/// Right, down-right, down and down-left: every move once when combined with its reverse.
pub(crate) const FORWARD_OFFSETS: [(i32, i32); 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..self.height() as i32 {
            let line: String = (0..self.width() as i32)
                .map(|x| if self.cells.get(x, y) { '#' } else { '.' })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Connected components of the free cells under the grid's move rule.
#[derive(Clone, Debug)]
pub struct Components {
    bounds: Rect,
    width: usize,
    components: UnionFind<usize>,
}

impl Components {
    fn ix(&self, point: &Point) -> Option<usize> {
        self.bounds
            .contains(point)
            .then(|| point.y as usize * self.width + point.x as usize)
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        match (self.ix(start), self.ix(goal)) {
            (Some(start_ix), Some(goal_ix)) => self.components.equiv(start_ix, goal_ix),
            _ => false,
        }
    }

    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        !self.reachable(start, goal)
    }
}
