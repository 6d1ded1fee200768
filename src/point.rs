//! Helpers on top of [grid_util]'s [Point], [Direction] and [Rect].
//!
//! Maps are stored row-major with `y` counting rows from the top, so [Direction::NORTH],
//! which adds one to `y`, moves one row further down a printed map. Code in this crate
//! reasons about moves through their offsets ([Point::from] a direction) and never relies on
//! the compass names.
use grid_util::{Direction, Point, Rect};

/// The eight moves in [Direction::num] order; [Direction::NONE] is never produced.
pub fn directions() -> impl Iterator<Item = Direction> + Clone {
    (0..8).filter_map(|num| Direction::try_from(num).ok())
}

pub fn cardinals() -> impl Iterator<Item = Direction> + Clone {
    directions().filter(|dir| !dir.diagonal())
}

pub fn diagonals() -> impl Iterator<Item = Direction> + Clone {
    directions().filter(|dir| dir.diagonal())
}

/// Length of a single step: 1 for cardinal moves and sqrt(2) for diagonal ones.
pub fn step_length(dir: Direction) -> f64 {
    if dir.diagonal() {
        std::f64::consts::SQRT_2
    } else {
        1.0
    }
}

pub fn opposite(dir: Direction) -> Direction {
    dir.rotate_cw(4)
}

pub fn squared_distance(a: &Point, b: &Point) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Euclidean distance in double precision; path lengths are summed from these.
pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    (squared_distance(a, b) as f64).sqrt()
}

/// The `width`x`height` block of cells whose top-left cell is (`x`, `y`). Both corners of
/// a [Rect] are inclusive, as in [Rect::contains] and [Rect::points_in].
pub fn cell_rect(x: i32, y: i32, width: i32, height: i32) -> Rect {
    Rect {
        x1: x,
        y1: y,
        x2: x + width - 1,
        y2: y + height - 1,
    }
}

/// Short label of a direction, named after its offset on a printed map (`y` down).
pub fn symbol(dir: Direction) -> &'static str {
    let offset = Point::from(dir);
    match (offset.x, offset.y) {
        (0, -1) => "up",
        (1, -1) => "up-right",
        (1, 0) => "right",
        (1, 1) => "down-right",
        (0, 1) => "down",
        (-1, 1) => "down-left",
        (-1, 0) => "left",
        (-1, -1) => "up-left",
        _ => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn eight_distinct_moves() {
        let offsets = directions().map(Point::from).collect_vec();
        assert_eq!(offsets.len(), 8);
        assert!(offsets.iter().all_unique());
        assert!(offsets
            .iter()
            .all(|offset| offset.move_distance(&Point::new(0, 0)) == 1));
        assert_eq!(cardinals().count(), 4);
        for dir in diagonals() {
            let offset = Point::from(dir);
            assert!(offset.x != 0 && offset.y != 0);
            assert_eq!(Point::from(dir.x_dir()), Point::new(offset.x, 0));
            assert_eq!(Point::from(dir.y_dir()), Point::new(0, offset.y));
        }
    }

    #[test]
    fn opposite_negates_the_offset() {
        for dir in directions() {
            assert_eq!(Point::from(opposite(dir)), -Point::from(dir));
            assert_eq!(Point::new(0, 0).dir_obj(&Point::from(dir)), dir);
        }
    }

    #[test]
    fn distances() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(squared_distance(&a, &b), 25);
        assert_eq!(euclidean_distance(&a, &b), 5.0);
        assert_eq!(step_length(Direction::EAST), 1.0);
        assert_eq!(step_length(Direction::NORTHWEST), std::f64::consts::SQRT_2);
    }

    #[test]
    fn cell_rects_are_inclusive() {
        let rect = cell_rect(2, 1, 3, 2);
        assert_eq!(rect.points_in().len(), 6);
        assert!(rect.contains(&Point::new(4, 2)));
        assert!(!rect.contains(&Point::new(5, 2)));
        assert!(!rect.contains(&Point::new(2, 3)));
        assert_eq!(symbol(Direction::NORTH), "down");
        assert_eq!(symbol(Direction::NONE), "none");
    }
}
