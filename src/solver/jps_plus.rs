//! Jump point search over a precomputed [JumpPointMap].
//!
//! A node reached while travelling in direction `D` only looks in the directions a jump
//! point can turn into: `D` and its two neighbouring diagonals or cardinals, plus the two
//! perpendicular cardinals when `D` itself is cardinal. Each jump consumes the signed
//! distance stored for the node and produces at most one child, so a whole straight or
//! diagonal run costs a single expansion.
use grid_util::{Direction, Point};
use log::warn;
use smallvec::SmallVec;

use crate::grid::Grid;
use crate::heuristic::{CostModel, Heuristic};
use crate::jump_map::JumpPointMap;
use crate::point::{directions, step_length};
use crate::search::{Next, SearchContext, SearchPolicy};
use crate::solver::{NotFoundReason, Path, PathSearch, Progress, SearchEvent, SearchOutcome};

#[derive(Clone, Debug)]
pub struct JpsPlusSearch<'a> {
    map: &'a JumpPointMap,
    model: CostModel<'a>,
    context: SearchContext<Point>,
}

impl<'a> JpsPlusSearch<'a> {
    pub fn new(
        grid: &'a Grid,
        map: &'a JumpPointMap,
        heuristic: &'a Heuristic,
        bounding_strength: f64,
        policy: SearchPolicy,
        start: Point,
        goal: Point,
    ) -> JpsPlusSearch<'a> {
        debug_assert_eq!((grid.width(), grid.height()), (map.width(), map.height()));
        let model = CostModel::new(heuristic, bounding_strength, start, goal);
        let mut context = SearchContext::new(policy, 2 * grid.width() * grid.height());
        context.push_root(start, model.root_priority());
        JpsPlusSearch {
            map,
            model,
            context,
        }
    }

    /// Where a jump from `from` towards `dir` ends and how long it is, if it ends anywhere
    /// worth expanding. Rays that pass the goal stop on it, or for diagonals on the row or
    /// column of the goal.
    fn jump(&self, from: Point, dir: Direction) -> Option<(Point, f64)> {
        let distance = self.map.distance(from, dir);
        let reach = distance.abs();
        let goal = self.model.goal();
        let step = Point::from(dir);
        let to_goal = goal - from;
        // Offsets to the goal measured along the direction of travel.
        let (ahead_x, ahead_y) = (to_goal.x * step.x, to_goal.y * step.y);
        if dir.diagonal() {
            if ahead_x > 0 && ahead_y > 0 && (ahead_x <= reach || ahead_y <= reach) {
                let steps = ahead_x.min(ahead_y);
                return Some((from + step * steps, steps as f64 * step_length(dir)));
            }
        } else {
            let ahead = ahead_x + ahead_y;
            let on_ray = if step.x != 0 { to_goal.y == 0 } else { to_goal.x == 0 };
            if on_ray && ahead > 0 && ahead <= reach {
                return Some((goal, ahead as f64));
            }
        }
        (distance > 0).then(|| (from + step * distance, distance as f64 * step_length(dir)))
    }
}

/// Directions worth jumping in from a node entered travelling `arrival`; all eight at the root.
pub fn jump_directions(arrival: Option<Direction>) -> SmallVec<[Direction; 8]> {
    match arrival {
        None => directions().collect(),
        Some(dir) if dir.diagonal() => [dir.rotate_ccw(1), dir, dir.rotate_cw(1)]
            .into_iter()
            .collect(),
        Some(dir) => [
            dir.rotate_ccw(2),
            dir.rotate_ccw(1),
            dir,
            dir.rotate_cw(1),
            dir.rotate_cw(2),
        ]
        .into_iter()
        .collect(),
    }
}

impl PathSearch for JpsPlusSearch<'_> {
    fn step(&mut self, events: &mut Vec<SearchEvent>) -> Progress {
        let id = match self.context.next_node() {
            Next::Expand(id) => id,
            Next::Exhausted => {
                return Progress::Done(SearchOutcome::PathNotFound(NotFoundReason::NoPathExists))
            }
            Next::LimitReached => {
                warn!(
                    "JPS+ search hit its iteration limit of {}",
                    self.context.iteration_limit()
                );
                return Progress::Done(SearchOutcome::PathNotFound(
                    NotFoundReason::IterationLimit,
                ));
            }
        };
        let node = self.context.get(id);
        events.push(SearchEvent::NodeVisited(node.position));
        if node.position == self.model.goal() {
            let waypoints = self.context.path_to(id);
            return Progress::Done(SearchOutcome::PathFound(Path::from_waypoints(waypoints)));
        }
        let arrival = self
            .context
            .parent_position(id)
            .map(|parent| parent.dir_obj(&node.position));
        for dir in jump_directions(arrival) {
            let Some((target, length)) = self.jump(node.position, dir) else {
                continue;
            };
            let priority = self
                .model
                .priority(node.cost, target, node.position, length);
            if self
                .context
                .relax(id, target, node.cost + length, priority)
                .queued()
                .is_some()
            {
                events.push(SearchEvent::NodeAddedToFrontier(target));
            }
        }
        self.context.reconcile();
        Progress::Running
    }

    fn nodes_analyzed(&self) -> usize {
        self.context.iterations()
    }

    fn nodes_allocated(&self) -> usize {
        self.context.allocated()
    }

    fn memory_estimate(&self) -> usize {
        self.context.memory_estimate()
    }
}
