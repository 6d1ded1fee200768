//! Offline jump point tables for JPS+.
//!
//! For every free cell and direction the map stores a signed distance. A positive value `d`
//! means travelling that way for `d` steps ends on a jump point; zero or a negative value
//! `-d` means the ray hits a wall after `d` steps without meeting one.
//!
//! The tables are filled in four passes:
//! 1. primary jump points next to obstacle corners,
//! 2. straight jump point flags for cells with line of sight to a primary jump point,
//! 3. straight distances from a run-length sweep over every row and column,
//! 4. diagonal jump points and distances from sweeps starting in each map corner.
use core::fmt;

use grid_util::{Direction, Point, SimpleValueGrid, ValueGrid};
use itertools::{iproduct, Itertools};
use log::info;

use crate::grid::Grid;
use crate::point::{cardinals, diagonals, directions, opposite, symbol};

/// Bit `d` of a flag cell refers to the direction with [Direction::num] `d`.
fn bit(dir: Direction) -> u8 {
    1 << dir.num()
}

#[derive(Clone, Debug)]
pub struct JumpPointMap {
    /// Cells that are jump points when entered travelling in the flagged directions.
    primary: SimpleValueGrid<u8>,
    /// Cells from which travelling in the flagged directions reaches a primary jump point.
    straight: SimpleValueGrid<u8>,
    /// Cells that are the first stop of a diagonal jump in the flagged directions.
    diagonal: SimpleValueGrid<u8>,
    distances: SimpleValueGrid<[i32; 8]>,
}

impl JumpPointMap {
    pub fn new(grid: &Grid) -> JumpPointMap {
        let (width, height) = (grid.width(), grid.height());
        let mut map = JumpPointMap {
            primary: SimpleValueGrid::new(width, height, 0),
            straight: SimpleValueGrid::new(width, height, 0),
            diagonal: SimpleValueGrid::new(width, height, 0),
            distances: SimpleValueGrid::new(width, height, [0; 8]),
        };
        map.mark_primary_jump_points(grid);
        map.mark_straight_jump_points(grid);
        map.compute_straight_distances(grid);
        map.compute_diagonal_distances(grid);
        info!(
            "Built jump point map for {}x{} grid with {} primary jump points",
            width,
            height,
            map.primary.values.iter().filter(|&&bits| bits != 0).count()
        );
        map
    }

    fn set_distance(&mut self, point: Point, dir: Direction, distance: i32) {
        let mut distances = self.distances.get_point(point);
        distances[dir.num() as usize] = distance;
        self.distances.set_point(point, distances);
    }

    /// A free cell diagonal to an obstacle whose two flanking cells are free is where a
    /// straight move first gets to turn around the obstacle corner. It is a jump point for
    /// arrivals along either flank.
    fn mark_primary_jump_points(&mut self, grid: &Grid) {
        let obstacles = iproduct!(0..self.height() as i32, 0..self.width() as i32)
            .map(|(y, x)| Point::new(x, y))
            .filter(|&p| !grid.can_move_to_simple(p))
            .collect_vec();
        for (obstacle, dir) in iproduct!(obstacles, diagonals()) {
            let candidate = obstacle + dir;
            if grid.can_move_to_simple(candidate)
                && grid.can_move_to_simple(obstacle + dir.x_dir())
                && grid.can_move_to_simple(obstacle + dir.y_dir())
            {
                let bits = self.primary.get_point(candidate) | bit(dir.x_dir()) | bit(dir.y_dir());
                self.primary.set_point(candidate, bits);
            }
        }
    }

    fn mark_straight_jump_points(&mut self, grid: &Grid) {
        for (jump_point, dir) in iproduct!(grid.free_cells(), cardinals()) {
            if self.primary.get_point(jump_point) & bit(dir) == 0 {
                continue;
            }
            let mut cell = jump_point + opposite(dir);
            while grid.can_move_to_simple(cell) {
                let bits = self.straight.get_point(cell) | bit(dir);
                self.straight.set_point(cell, bits);
                cell = cell + opposite(dir);
            }
        }
    }

    /// Walks every line against the direction of travel so each cell sees what lies ahead of
    /// it. The counter restarts at obstacles and at primary jump points.
    fn compute_straight_distances(&mut self, grid: &Grid) {
        let (width, height) = (self.width() as i32, self.height() as i32);
        for dir in cardinals() {
            let step = Point::from(dir);
            let lines: Vec<Vec<Point>> = if step.x != 0 {
                (0..height)
                    .map(|y| (0..width).map(|x| Point::new(x, y)).collect())
                    .collect()
            } else {
                (0..width)
                    .map(|x| (0..height).map(|y| Point::new(x, y)).collect())
                    .collect()
            };
            for mut line in lines {
                if step.x + step.y > 0 {
                    line.reverse();
                }
                let mut count = -1;
                let mut jump_point_seen = false;
                for cell in line {
                    if !grid.can_move_to_simple(cell) {
                        count = -1;
                        jump_point_seen = false;
                        self.set_distance(cell, dir, 0);
                        continue;
                    }
                    count += 1;
                    debug_assert_eq!(jump_point_seen, self.is_straight_jump_point(cell, dir));
                    self.set_distance(cell, dir, if jump_point_seen { count } else { -count });
                    if self.is_primary_jump_point(cell, dir) {
                        count = 0;
                        jump_point_seen = true;
                    }
                }
            }
        }
    }

    /// A diagonal jump stops on the first cell from which one of its two cardinal components
    /// sees a jump point. Every other cell extends the value of its diagonal neighbour, so rows
    /// are visited starting from the corner the direction points at.
    fn compute_diagonal_distances(&mut self, grid: &Grid) {
        let (width, height) = (self.width() as i32, self.height() as i32);
        for dir in diagonals() {
            let step = Point::from(dir);
            let rows: Vec<i32> = if step.y < 0 {
                (0..height).collect()
            } else {
                (0..height).rev().collect()
            };
            let columns: Vec<i32> = if step.x > 0 {
                (0..width).rev().collect()
            } else {
                (0..width).collect()
            };
            let components = bit(dir.x_dir()) | bit(dir.y_dir());
            for (&y, &x) in iproduct!(rows.iter(), columns.iter()) {
                let cell = Point::new(x, y);
                if !grid.can_move_to_simple(cell) {
                    continue;
                }
                if !grid.can_step(cell, dir) {
                    self.set_distance(cell, dir, 0);
                    continue;
                }
                let next = cell + dir;
                if self.straight.get_point(next) & components != 0 {
                    let bits = self.diagonal.get_point(next) | bit(dir);
                    self.diagonal.set_point(next, bits);
                    self.set_distance(cell, dir, 1);
                } else {
                    let jump = self.distance(next, dir);
                    self.set_distance(cell, dir, if jump > 0 { jump + 1 } else { jump - 1 });
                }
            }
        }
    }

    pub fn width(&self) -> usize {
        self.distances.width()
    }

    pub fn height(&self) -> usize {
        self.distances.height()
    }

    /// Signed distance from an in-bounds cell towards `dir`.
    pub fn distance(&self, point: Point, dir: Direction) -> i32 {
        self.distances.get_point(point)[dir.num() as usize]
    }

    pub fn distances(&self, point: Point) -> [i32; 8] {
        self.distances.get_point(point)
    }

    pub fn is_primary_jump_point(&self, point: Point, dir: Direction) -> bool {
        self.primary.get_point(point) & bit(dir) != 0
    }

    pub fn is_straight_jump_point(&self, point: Point, dir: Direction) -> bool {
        self.straight.get_point(point) & bit(dir) != 0
    }

    pub fn is_diagonal_jump_point(&self, point: Point, dir: Direction) -> bool {
        self.diagonal.get_point(point) & bit(dir) != 0
    }

    /// The full distance table, row-major.
    pub fn table(&self) -> &[[i32; 8]] {
        &self.distances.values
    }
}

impl PartialEq for JumpPointMap {
    fn eq(&self, other: &Self) -> bool {
        (self.width(), self.height()) == (other.width(), other.height())
            && self.primary.values == other.primary.values
            && self.straight.values == other.straight.values
            && self.diagonal.values == other.diagonal.values
            && self.distances.values == other.distances.values
    }
}

impl Eq for JumpPointMap {}

impl fmt::Display for JumpPointMap {
    /// One block per direction. Primary jump points carry a `*`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cell_width = self
            .table()
            .iter()
            .flatten()
            .map(|d| d.to_string().len())
            .max()
            .unwrap_or(1);
        for dir in directions() {
            writeln!(f, "{}:", symbol(dir))?;
            for y in 0..self.height() as i32 {
                let line = (0..self.width() as i32)
                    .map(|x| {
                        let cell = Point::new(x, y);
                        let marker = if self.primary.get_point(cell) != 0 { '*' } else { ' ' };
                        format!("{:>cell_width$}{marker}", self.distance(cell, dir))
                    })
                    .join(" ");
                writeln!(f, "{}", line.trim_end())?;
            }
        }
        Ok(())
    }
}
