use grid_util::Point;
use log::warn;

use crate::grid::Grid;
use crate::heuristic::{CostModel, Heuristic};
use crate::search::{Next, NodeId, SearchContext, SearchPolicy};
use crate::solver::{NotFoundReason, Path, PathSearch, Progress, SearchEvent, SearchOutcome};

/// Classical best-first search expanding one cell at a time.
#[derive(Clone, Debug)]
pub struct AstarSearch<'a> {
    grid: &'a Grid,
    model: CostModel<'a>,
    context: SearchContext<Point>,
}

impl<'a> AstarSearch<'a> {
    pub fn new(
        grid: &'a Grid,
        heuristic: &'a Heuristic,
        bounding_strength: f64,
        policy: SearchPolicy,
        start: Point,
        goal: Point,
    ) -> AstarSearch<'a> {
        let model = CostModel::new(heuristic, bounding_strength, start, goal);
        let mut context = SearchContext::new(policy, 2 * grid.width() * grid.height());
        context.push_root(start, model.root_priority());
        AstarSearch {
            grid,
            model,
            context,
        }
    }
}

/// Offers every legal move out of the expanded node that stays `within` the search area.
pub(crate) fn relax_neighbors<F>(
    grid: &Grid,
    model: &CostModel,
    context: &mut SearchContext<Point>,
    id: NodeId,
    events: &mut Vec<SearchEvent>,
    within: F,
) where
    F: Fn(Point) -> bool,
{
    let node = context.get(id);
    for (next, cost) in grid.neighborhood_points_and_cost(&node.position) {
        if !within(next) {
            continue;
        }
        let priority = model.priority(node.cost, next, node.position, cost);
        if context
            .relax(id, next, node.cost + cost, priority)
            .queued()
            .is_some()
        {
            events.push(SearchEvent::NodeAddedToFrontier(next));
        }
    }
    context.reconcile();
}

impl PathSearch for AstarSearch<'_> {
    fn step(&mut self, events: &mut Vec<SearchEvent>) -> Progress {
        let id = match self.context.next_node() {
            Next::Expand(id) => id,
            Next::Exhausted => {
                return Progress::Done(SearchOutcome::PathNotFound(NotFoundReason::NoPathExists))
            }
            Next::LimitReached => {
                warn!(
                    "A* search hit its iteration limit of {}",
                    self.context.iteration_limit()
                );
                return Progress::Done(SearchOutcome::PathNotFound(
                    NotFoundReason::IterationLimit,
                ));
            }
        };
        let position = self.context.get(id).position;
        events.push(SearchEvent::NodeVisited(position));
        if position == self.model.goal() {
            let nodes = self.context.path_to(id);
            return Progress::Done(SearchOutcome::PathFound(Path::from_nodes(nodes)));
        }
        relax_neighbors(self.grid, &self.model, &mut self.context, id, events, |_| true);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::heuristic::HeuristicKind;

    fn solve(grid: &Grid, start: Point, goal: Point) -> SearchOutcome {
        let heuristic = Heuristic::new(HeuristicKind::Euclidean);
        let mut search =
            AstarSearch::new(grid, &heuristic, 0.0, SearchPolicy::default(), start, goal);
        let mut events = Vec::new();
        loop {
            if let Progress::Done(outcome) = search.step(&mut events) {
                return outcome;
            }
        }
    }

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        let grid = Grid::filled(1, 1, Cell::Free).unwrap();
        let start = Point::new(0, 0);
        let outcome = solve(&grid, start, start);
        let path = outcome.path().unwrap();
        assert_eq!(path.nodes, vec![start]);
        assert_eq!(path.length, 0.0);
    }

    /// The obstacle in the middle blocks the diagonal shortcuts on both sides.
    #[test]
    fn solve_simple_problem() {
        let mut grid = Grid::filled(3, 3, Cell::Free).unwrap();
        grid.set(Point::new(1, 1), Cell::Obstacle);
        let outcome = solve(&grid, Point::new(0, 0), Point::new(2, 2));
        let path = outcome.path().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.length, 4.0);
    }

    #[test]
    fn test_complex() {
        let mut grid = Grid::filled(10, 10, Cell::Free).unwrap();
        for (x, y) in [(1, 1), (5, 0), (0, 5), (8, 8)] {
            grid.set(Point::new(x, y), Cell::Obstacle);
        }
        let outcome = solve(&grid, Point::new(0, 0), Point::new(7, 7));
        let path = outcome.path().unwrap();
        // (1, 1) forces two straight steps before the diagonal run can start.
        assert_eq!(path.len(), 10);
        let expected = 5.0 * std::f64::consts::SQRT_2 + 4.0;
        assert!((path.length - expected).abs() < 1e-9);
    }

    #[test]
    fn events_report_visits_and_frontier() {
        let grid = Grid::filled(3, 1, Cell::Free).unwrap();
        let heuristic = Heuristic::new(HeuristicKind::Euclidean);
        let mut search = AstarSearch::new(
            &grid,
            &heuristic,
            0.0,
            SearchPolicy::default(),
            Point::new(0, 0),
            Point::new(2, 0),
        );
        let mut events = Vec::new();
        assert_eq!(search.step(&mut events), Progress::Running);
        assert_eq!(
            events,
            vec![
                SearchEvent::NodeVisited(Point::new(0, 0)),
                SearchEvent::NodeAddedToFrontier(Point::new(1, 0)),
            ]
        );
        assert_eq!(search.nodes_analyzed(), 1);
        assert_eq!(search.nodes_allocated(), 2);
    }

    #[test]
    fn walled_in_goal_is_not_found() {
        let grid = Grid::from_ascii(
            "
            ..#..
            ..#..
            ..#..
            ",
        )
        .unwrap();
        let outcome = solve(&grid, Point::new(0, 0), Point::new(4, 2));
        assert_eq!(
            outcome,
            SearchOutcome::PathNotFound(NotFoundReason::NoPathExists)
        );
    }
}
