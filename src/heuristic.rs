//! Cost estimates and the goal-bounding bias.
use grid_util::Point;
use serde::{Deserialize, Serialize};

use crate::point::squared_distance;

/// Squared integer distances below this bound are answered from a lookup table.
pub const SQRT_TABLE_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    #[default]
    Euclidean,
    Manhattan,
}

impl HeuristicKind {
    pub fn name(self) -> &'static str {
        match self {
            HeuristicKind::Euclidean => "euclidean",
            HeuristicKind::Manhattan => "manhattan",
        }
    }
}

/// Distance estimate between two cells. Euclidean is admissible on the 8-connected grid,
/// Manhattan overestimates diagonal travel and trades optimality for fewer expansions.
#[derive(Clone, Debug)]
pub struct Heuristic {
    kind: HeuristicKind,
    sqrt_table: Vec<f64>,
}

impl Heuristic {
    pub fn new(kind: HeuristicKind) -> Heuristic {
        let sqrt_table = match kind {
            HeuristicKind::Euclidean => (0..SQRT_TABLE_SIZE).map(|i| (i as f64).sqrt()).collect(),
            HeuristicKind::Manhattan => Vec::new(),
        };
        Heuristic { kind, sqrt_table }
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }

    pub fn distance(&self, from: Point, to: Point) -> f64 {
        match self.kind {
            HeuristicKind::Euclidean => {
                let squared = squared_distance(&from, &to);
                match self.sqrt_table.get(squared as usize) {
                    Some(&root) => root,
                    None => (squared as f64).sqrt(),
                }
            }
            HeuristicKind::Manhattan => from.manhattan_distance(&to) as f64,
        }
    }

    /// Priority of a node at `from` reached with `parent_cost + step_length`, estimating the
    /// remaining distance to `to`.
    pub fn cost(&self, parent_cost: f64, from: Point, to: Point, step_length: f64) -> f64 {
        self.cost_with(parent_cost, from, to, step_length, |estimate| estimate)
    }

    /// Like [Heuristic::cost], with `modifier` applied to the remaining-distance estimate only.
    pub fn cost_with<F>(
        &self,
        parent_cost: f64,
        from: Point,
        to: Point,
        step_length: f64,
        modifier: F,
    ) -> f64
    where
        F: FnOnce(f64) -> f64,
    {
        parent_cost + step_length + modifier(self.distance(from, to))
    }
}

/// Inflates estimates for nodes whose heading strays from the goal. The bias is
/// `base * sin(angle) * strength`, where the angle lies between the start->node vector and
/// the parent->goal vector; a strength of zero leaves every estimate untouched.
#[derive(Clone, Debug)]
pub struct GoalBounding {
    strength: f64,
    sin_table: [f64; 181],
}

impl GoalBounding {
    pub fn new(strength: f64) -> GoalBounding {
        let mut sin_table = [0.0; 181];
        for (degrees, value) in sin_table.iter_mut().enumerate() {
            *value = (degrees as f64).to_radians().sin() * strength;
        }
        GoalBounding {
            strength,
            sin_table,
        }
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn is_identity(&self) -> bool {
        self.strength == 0.0
    }

    /// Angle in whole degrees between the two vectors, 0 if either has zero length.
    pub fn angle(a: Point, b: Point) -> usize {
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);
        let norms = (ax * ax + ay * ay).sqrt() * (bx * bx + by * by).sqrt();
        if norms == 0.0 {
            return 0;
        }
        let cos = ((ax * bx + ay * by) / norms).clamp(-1.0, 1.0);
        (cos.acos().to_degrees().round() as usize).min(180)
    }

    pub fn apply(&self, base: f64, start: Point, node: Point, parent: Point, goal: Point) -> f64 {
        if self.is_identity() {
            return base;
        }
        let angle = GoalBounding::angle(node - start, goal - parent);
        base + base * self.sin_table[angle]
    }
}

/// Everything a search run needs to rank its nodes, built once per run.
#[derive(Clone, Debug)]
pub struct CostModel<'a> {
    heuristic: &'a Heuristic,
    bounding: GoalBounding,
    start: Point,
    goal: Point,
}

impl<'a> CostModel<'a> {
    pub fn new(heuristic: &'a Heuristic, bounding_strength: f64, start: Point, goal: Point) -> Self {
        CostModel {
            heuristic,
            bounding: GoalBounding::new(bounding_strength),
            start,
            goal,
        }
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Heuristic cost (priority) of a node reached from `parent` with `parent_cost + step`.
    /// Goal bounding only inflates the estimate of the remaining distance.
    pub fn priority(&self, parent_cost: f64, node: Point, parent: Point, step: f64) -> f64 {
        if self.bounding.is_identity() {
            return self.heuristic.cost(parent_cost, node, self.goal, step);
        }
        self.heuristic
            .cost_with(parent_cost, node, self.goal, step, |estimate| {
                self.bounding
                    .apply(estimate, self.start, node, parent, self.goal)
            })
    }

    pub fn root_priority(&self) -> f64 {
        self.heuristic.cost(0.0, self.start, self.goal, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_table_matches_sqrt() {
        let h = Heuristic::new(HeuristicKind::Euclidean);
        assert_eq!(h.distance(Point::new(0, 0), Point::new(3, 4)), 5.0);
        // Outside the table
        let far = h.distance(Point::new(0, 0), Point::new(100, 100));
        assert!((far - 100.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
        assert_eq!(h.cost(2.0, Point::new(0, 0), Point::new(3, 4), 1.0), 8.0);
    }

    #[test]
    fn manhattan_sums_offsets() {
        let h = Heuristic::new(HeuristicKind::Manhattan);
        assert_eq!(h.distance(Point::new(1, 1), Point::new(4, -3)), 7.0);
    }

    #[test]
    fn zero_strength_is_identity() {
        let bounding = GoalBounding::new(0.0);
        let value = bounding.apply(
            3.0,
            Point::new(0, 0),
            Point::new(0, 5),
            Point::new(0, 4),
            Point::new(9, 0),
        );
        assert_eq!(value, 3.0);
    }

    #[test]
    fn bounding_penalises_perpendicular_headings() {
        let bounding = GoalBounding::new(0.5);
        let start = Point::new(0, 0);
        let goal = Point::new(10, 0);
        // Heading straight at the goal: angle 0, no inflation.
        let aligned = bounding.apply(4.0, start, Point::new(6, 0), Point::new(5, 0), goal);
        assert_eq!(aligned, 4.0);
        // Moving away perpendicular to the goal bearing: angle 90.
        assert_eq!(GoalBounding::angle(Point::new(0, 5), Point::new(10, -4)), 112);
        let stray = bounding.apply(4.0, start, Point::new(0, 5), Point::new(0, 4), goal);
        assert!(stray > 4.0);
        assert!(stray <= 4.0 + 4.0 * 0.5 + 1e-9);
    }

    #[test]
    fn angles() {
        let p = Point::new;
        assert_eq!(GoalBounding::angle(p(1, 0), p(0, 1)), 90);
        assert_eq!(GoalBounding::angle(p(1, 0), p(-1, 0)), 180);
        assert_eq!(GoalBounding::angle(p(1, 1), p(2, 2)), 0);
        assert_eq!(GoalBounding::angle(p(0, 0), p(2, 2)), 0);
    }

    #[test]
    fn priority_is_the_heuristic_cost() {
        let heuristic = Heuristic::new(HeuristicKind::Euclidean);
        let (start, goal) = (Point::new(0, 0), Point::new(10, 0));
        let (parent, node) = (Point::new(0, 4), Point::new(0, 5));

        let plain = CostModel::new(&heuristic, 0.0, start, goal);
        assert_eq!(
            plain.priority(4.0, node, parent, 1.0),
            heuristic.cost(4.0, node, goal, 1.0)
        );
        assert_eq!(plain.root_priority(), 10.0);

        // Bounding inflates the remaining-distance term and leaves the path cost alone.
        let bounded = CostModel::new(&heuristic, 0.5, start, goal);
        let inflated = GoalBounding::new(0.5).apply(
            heuristic.distance(node, goal),
            start,
            node,
            parent,
            goal,
        );
        assert_eq!(bounded.priority(4.0, node, parent, 1.0), 4.0 + 1.0 + inflated);
        assert!(bounded.priority(4.0, node, parent, 1.0) > heuristic.cost(4.0, node, goal, 1.0));
        // Heading at the goal is not penalised.
        let (parent, node) = (Point::new(4, 0), Point::new(5, 0));
        assert_eq!(
            bounded.priority(5.0, node, parent, 1.0),
            heuristic.cost(5.0, node, goal, 1.0)
        );
    }
}
