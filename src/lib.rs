//! # grid_pathing
//!
//! Pathfinding on a binary occupancy grid with three interchangeable strategies:
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm), hierarchical A* over fixed-size
//! chunks, and JPS+, which precomputes
//! [jump point](https://en.wikipedia.org/wiki/Jump_point_search) distances for every cell
//! and direction. Movement is 8-connected and never cuts corners: a diagonal step needs
//! both flanking cells to be free.
//!
//! Searches are advanced one expansion at a time through a [SearchRun], which can be
//! paused, resumed or cancelled between steps and reports what each step visited.
//!
//! ```
//! use grid_pathing::{Grid, Pathfinder, Point, SearchConfig};
//!
//! let grid = Grid::from_ascii(
//!     "
//!     S...
//!     .##.
//!     ...G
//!     ",
//! )
//! .unwrap();
//! let finder = Pathfinder::new(grid, SearchConfig::default()).unwrap();
//! let report = finder.find_path(Point::new(0, 0), Point::new(3, 2)).unwrap();
//! assert!(report.is_found());
//! ```
pub mod batch;
pub mod chunks;
pub mod config;
pub mod error;
pub mod grid;
pub mod heuristic;
pub mod jump_map;
pub mod open_list;
pub mod pathfinder;
pub mod point;
pub mod runner;
pub mod search;
pub mod solver;
pub mod stats;

/// Inline capacity of neighbourhood buffers; a cell has at most eight neighbours.
pub const N_SMALLVEC_SIZE: usize = 8;

pub use crate::config::{Algorithm, SearchConfig};
pub use crate::error::{PathfindingError, Result};
pub use crate::grid::{Cell, Grid};
pub use crate::heuristic::HeuristicKind;
pub use crate::pathfinder::Pathfinder;
pub use crate::runner::{RunState, SearchReport, SearchRun, Statistics};
pub use crate::solver::{NotFoundReason, Path, SearchEvent, SearchOutcome};
pub use grid_util::{Direction, Point, Rect};
