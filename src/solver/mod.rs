//! The three search strategies and the types they report through.
//!
//! Every strategy is a [PathSearch]: a state machine advanced one expansion at a time, so a
//! host can interleave searching with rendering or abandon a run between two steps.
use core::fmt;

use grid_util::Point;
use itertools::Itertools;
use thiserror::Error;

use crate::chunks::ChunkCoord;
use crate::point::euclidean_distance;

pub mod astar;
pub mod hpa;
pub mod jps_plus;

/// Incremental output of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchEvent {
    NodeVisited(Point),
    NodeAddedToFrontier(Point),
    /// Chunk-level counterparts emitted by the hierarchical search.
    ChunkVisited(ChunkCoord),
    ChunkAddedToFrontier(ChunkCoord),
}

/// Why a run ended without a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum NotFoundReason {
    #[error("no path exists")]
    NoPathExists,
    #[error("iteration limit reached")]
    IterationLimit,
    #[error("no path inside chunk {chunk}")]
    PathNotFoundInsideChunk { chunk: ChunkCoord },
    #[error("search cancelled")]
    Cancelled,
}

/// A path from start to goal. `waypoints` are the positions the search actually
/// connected (every cell for A*, jump points for JPS+, segment joins for HPA*), `nodes`
/// the full cell-by-cell chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub waypoints: Vec<Point>,
    pub nodes: Vec<Point>,
    pub length: f64,
}

impl Path {
    pub fn new(waypoints: Vec<Point>, nodes: Vec<Point>) -> Path {
        let length = path_length(&nodes);
        Path {
            waypoints,
            nodes,
            length,
        }
    }

    /// A path whose waypoints are already adjacent cells.
    pub fn from_nodes(nodes: Vec<Point>) -> Path {
        Path::new(nodes.clone(), nodes)
    }

    /// Fills in the cells between straight or diagonal waypoints.
    pub fn from_waypoints(waypoints: Vec<Point>) -> Path {
        let nodes = waypoints_to_path(&waypoints);
        Path::new(waypoints, nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<Point> {
        self.nodes.last().copied()
    }
}

/// Converts waypoints into a cell-by-cell path. Consecutive waypoints must lie on a common
/// row, column or diagonal.
pub fn waypoints_to_path(waypoints: &[Point]) -> Vec<Point> {
    let Some((&first, rest)) = waypoints.split_first() else {
        return Vec::new();
    };
    let mut path = vec![first];
    let mut current = first;
    for next in rest {
        while current != *next {
            current = current + current.dir_obj(next);
            path.push(current);
        }
    }
    path
}

/// Euclidean length of a chain of cells.
pub fn path_length(nodes: &[Point]) -> f64 {
    nodes
        .iter()
        .tuple_windows()
        .map(|(a, b)| euclidean_distance(a, b))
        .sum()
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    PathFound(Path),
    PathNotFound(NotFoundReason),
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchOutcome::PathFound(path) => Some(path),
            SearchOutcome::PathNotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::PathFound(_))
    }

    pub fn reason(&self) -> Option<NotFoundReason> {
        match self {
            SearchOutcome::PathFound(_) => None,
            SearchOutcome::PathNotFound(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchOutcome::PathFound(path) => write!(
                f,
                "path found ({} nodes, length {:.3})",
                path.len(),
                path.length
            ),
            SearchOutcome::PathNotFound(reason) => write!(f, "path not found: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    Running,
    Done(SearchOutcome),
}

/// A search advanced one expansion per [step](PathSearch::step). After a step returned
/// [Progress::Done] the search must not be stepped again.
pub trait PathSearch {
    /// Expands one node and appends what happened to `events`.
    fn step(&mut self, events: &mut Vec<SearchEvent>) -> Progress;

    /// Nodes expanded so far, over every level for hierarchical searches.
    fn nodes_analyzed(&self) -> usize;

    /// Nodes allocated so far.
    fn nodes_allocated(&self) -> usize;

    /// Approximate bytes held by the working set.
    fn memory_estimate(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoints_expand_to_adjacent_cells() {
        let waypoints = vec![Point::new(0, 0), Point::new(3, 3), Point::new(3, 5)];
        let path = Path::from_waypoints(waypoints.clone());
        assert_eq!(path.waypoints, waypoints);
        assert_eq!(path.len(), 6);
        assert!(path
            .nodes
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.move_distance(b) == 1));
        let expected = 3.0 * std::f64::consts::SQRT_2 + 2.0;
        assert!((path.length - expected).abs() < 1e-9);
    }

    #[test]
    fn single_waypoint() {
        let path = Path::from_waypoints(vec![Point::new(2, 2)]);
        assert_eq!(path.nodes, vec![Point::new(2, 2)]);
        assert_eq!(path.length, 0.0);
        assert!(waypoints_to_path(&[]).is_empty());
    }

    #[test]
    fn outcome_display() {
        let found = SearchOutcome::PathFound(Path::from_nodes(vec![
            Point::new(0, 0),
            Point::new(1, 0),
        ]));
        assert_eq!(found.to_string(), "path found (2 nodes, length 1.000)");
        let inside = SearchOutcome::PathNotFound(NotFoundReason::PathNotFoundInsideChunk {
            chunk: ChunkCoord::new(1, 2),
        });
        assert_eq!(inside.to_string(), "path not found: no path inside chunk [1, 2]");
        assert_eq!(inside.reason(), Some(NotFoundReason::PathNotFoundInsideChunk {
            chunk: ChunkCoord::new(1, 2),
        }));
    }
}
