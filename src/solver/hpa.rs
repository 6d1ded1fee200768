//! Hierarchical search over a [ChunkPartition].
//!
//! The first phase searches the region graph: nodes are regions, edges join regions of
//! neighbouring chunks. Chunk coordinates double as positions for the cost model, so every
//! edge costs one chunk step. The second phase walks the resulting region chain from the
//! start and runs a small search confined to each chunk, ending on a cell that can step
//! into the next region of the chain. The neighbour it steps into starts the next segment.
use std::hash::Hash;

use grid_util::Point;
use log::{debug, warn};

use crate::chunks::{Chunk, ChunkCoord, ChunkPartition, RegionId};
use crate::grid::Grid;
use crate::heuristic::{CostModel, Heuristic};
use crate::point::step_length;
use crate::search::{Next, NodeId, SearchContext, SearchPolicy};
use crate::solver::astar::relax_neighbors;
use crate::solver::{NotFoundReason, Path, PathSearch, Progress, SearchEvent, SearchOutcome};

#[derive(Clone, Debug)]
enum Phase<'a> {
    /// Search over regions.
    Abstract {
        model: CostModel<'a>,
        context: SearchContext<RegionId>,
        goal_region: Option<RegionId>,
    },
    /// Cell-level search along the region chain.
    Refine(Refinement<'a>),
    Finished,
}

#[derive(Clone, Debug)]
struct Refinement<'a> {
    regions: Vec<RegionId>,
    /// Position in `regions` of the region being searched.
    index: usize,
    local: LocalSearch<'a>,
    waypoints: Vec<Point>,
    nodes: Vec<Point>,
}

/// Search confined to one chunk. Without a target region it looks for the literal goal.
#[derive(Clone, Debug)]
struct LocalSearch<'a> {
    chunk: &'a Chunk,
    target: Option<RegionId>,
    model: CostModel<'a>,
    context: SearchContext<Point>,
}

enum LocalStep {
    Running,
    /// The segment ends on node `exit`; `entry` is the first cell of the next segment.
    Reached { exit: NodeId, entry: Option<Point> },
    Failed,
}

/// Counters of the searches that already finished.
#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    analyzed: usize,
    allocated: usize,
    peak_memory: usize,
}

impl Totals {
    fn absorb<N: Eq + Hash + Copy>(&mut self, context: &SearchContext<N>) {
        self.analyzed += context.iterations();
        self.allocated += context.allocated();
        self.peak_memory = self.peak_memory.max(context.memory_estimate());
    }
}

#[derive(Clone, Debug)]
pub struct HpaSearch<'a> {
    grid: &'a Grid,
    partition: &'a ChunkPartition,
    heuristic: &'a Heuristic,
    bounding_strength: f64,
    policy: SearchPolicy,
    start: Point,
    goal: Point,
    phase: Phase<'a>,
    totals: Totals,
}

impl<'a> HpaSearch<'a> {
    /// `partition` must have been built from `grid`.
    pub fn new(
        grid: &'a Grid,
        partition: &'a ChunkPartition,
        heuristic: &'a Heuristic,
        bounding_strength: f64,
        policy: SearchPolicy,
        start: Point,
        goal: Point,
    ) -> HpaSearch<'a> {
        let model = CostModel::new(
            heuristic,
            bounding_strength,
            partition.chunk_of(start).as_point(),
            partition.chunk_of(goal).as_point(),
        );
        let mut context = SearchContext::new(policy, 2 * partition.region_count());
        // A blocked start has no region and leaves the open list empty.
        if let Some(start_region) = partition.region_of(start) {
            context.push_root(start_region, model.root_priority());
        }
        HpaSearch {
            grid,
            partition,
            heuristic,
            bounding_strength,
            policy,
            start,
            goal,
            phase: Phase::Abstract {
                model,
                context,
                goal_region: partition.region_of(goal),
            },
            totals: Totals::default(),
        }
    }

    /// Search from `start` through the chunk of `regions[index]`, towards the next region of
    /// the chain or the goal. Fails for a region the partition does not know.
    fn local_search(
        &self,
        regions: &[RegionId],
        index: usize,
        start: Point,
    ) -> Result<LocalSearch<'a>, NotFoundReason> {
        let partition = self.partition;
        let missing = || NotFoundReason::PathNotFoundInsideChunk {
            chunk: partition.chunk_of(start),
        };
        let chunk = regions
            .get(index)
            .and_then(|&region| partition.region_chunk(region))
            .ok_or_else(missing)?;
        let target = regions.get(index + 1).copied();
        let aim = match target {
            Some(next) => partition.region_chunk(next).ok_or_else(missing)?.center(),
            None => self.goal,
        };
        let model = CostModel::new(self.heuristic, self.bounding_strength, start, aim);
        let mut context = SearchContext::new(self.policy, 2 * chunk.area());
        context.push_root(start, model.root_priority());
        Ok(LocalSearch {
            chunk,
            target,
            model,
            context,
        })
    }

    fn step_abstract(&mut self, events: &mut Vec<SearchEvent>) -> Progress {
        let (grid, partition) = (self.grid, self.partition);
        let Phase::Abstract {
            model,
            context,
            goal_region,
        } = &mut self.phase
        else {
            return Progress::Running;
        };
        let id = match context.next_node() {
            Next::Expand(id) => id,
            Next::Exhausted => {
                self.totals.absorb(context);
                return self.finish(SearchOutcome::PathNotFound(NotFoundReason::NoPathExists));
            }
            Next::LimitReached => {
                warn!(
                    "HPA* chunk search hit its iteration limit of {}",
                    context.iteration_limit()
                );
                self.totals.absorb(context);
                return self.finish(SearchOutcome::PathNotFound(NotFoundReason::IterationLimit));
            }
        };
        let node = context.get(id);
        let region = partition.region(node.position);
        events.push(SearchEvent::ChunkVisited(region.chunk));
        if Some(node.position) == *goal_region {
            let regions = context.path_to(id);
            debug!("HPA* chunk path spans {} regions", regions.len());
            self.totals.absorb(context);
            let local = match self.local_search(&regions, 0, self.start) {
                Ok(local) => local,
                Err(reason) => {
                    warn!("HPA* could not refine the region chain: {reason}");
                    return self.finish(SearchOutcome::PathNotFound(reason));
                }
            };
            self.phase = Phase::Refine(Refinement {
                regions,
                index: 0,
                local,
                waypoints: vec![self.start],
                nodes: Vec::new(),
            });
            return Progress::Running;
        }
        let here = region.chunk.as_point();
        for &(dir, next) in region.links() {
            if !partition.passable(grid, region.chunk, dir) {
                continue;
            }
            let next_chunk = partition.region(next).chunk;
            let step = step_length(dir);
            let priority = model.priority(node.cost, next_chunk.as_point(), here, step);
            if context
                .relax(id, next, node.cost + step, priority)
                .queued()
                .is_some()
            {
                events.push(SearchEvent::ChunkAddedToFrontier(next_chunk));
            }
        }
        context.reconcile();
        Progress::Running
    }

    fn step_refine(&mut self, events: &mut Vec<SearchEvent>) -> Progress {
        let Phase::Refine(refinement) = &mut self.phase else {
            return Progress::Running;
        };
        match refinement.local.step(self.grid, self.partition, events) {
            LocalStep::Running => Progress::Running,
            LocalStep::Failed => {
                let chunk = refinement.local.chunk.coord;
                warn!("HPA* local search found no way through chunk {chunk}");
                self.totals.absorb(&refinement.local.context);
                self.finish(SearchOutcome::PathNotFound(
                    NotFoundReason::PathNotFoundInsideChunk { chunk },
                ))
            }
            LocalStep::Reached { exit, entry } => {
                refinement
                    .nodes
                    .extend(refinement.local.context.path_to(exit));
                self.totals.absorb(&refinement.local.context);
                match entry {
                    Some(entry) => {
                        refinement.index += 1;
                        refinement.waypoints.push(entry);
                        let regions = std::mem::take(&mut refinement.regions);
                        let index = refinement.index;
                        let local = match self.local_search(&regions, index, entry) {
                            Ok(local) => local,
                            Err(reason) => {
                                warn!("HPA* could not refine the region chain: {reason}");
                                return self.finish(SearchOutcome::PathNotFound(reason));
                            }
                        };
                        if let Phase::Refine(refinement) = &mut self.phase {
                            refinement.regions = regions;
                            refinement.local = local;
                        }
                        Progress::Running
                    }
                    None => {
                        let mut waypoints = std::mem::take(&mut refinement.waypoints);
                        let nodes = std::mem::take(&mut refinement.nodes);
                        if waypoints.last() != Some(&self.goal) {
                            waypoints.push(self.goal);
                        }
                        self.finish(SearchOutcome::PathFound(Path::new(waypoints, nodes)))
                    }
                }
            }
        }
    }

    fn finish(&mut self, outcome: SearchOutcome) -> Progress {
        self.phase = Phase::Finished;
        Progress::Done(outcome)
    }

    /// Region chain found by the first phase, start to goal.
    pub fn region_path(&self) -> Option<&[RegionId]> {
        match &self.phase {
            Phase::Refine(refinement) => Some(&refinement.regions),
            _ => None,
        }
    }

    /// Chunk being refined, if the search is in its second phase.
    pub fn current_chunk(&self) -> Option<ChunkCoord> {
        match &self.phase {
            Phase::Refine(refinement) => Some(refinement.local.chunk.coord),
            _ => None,
        }
    }
}

impl LocalSearch<'_> {
    fn step(
        &mut self,
        grid: &Grid,
        partition: &ChunkPartition,
        events: &mut Vec<SearchEvent>,
    ) -> LocalStep {
        let id = match self.context.next_node() {
            Next::Expand(id) => id,
            Next::Exhausted | Next::LimitReached => return LocalStep::Failed,
        };
        let position = self.context.get(id).position;
        events.push(SearchEvent::NodeVisited(position));
        match self.target {
            None if position == self.model.goal() => {
                return LocalStep::Reached {
                    exit: id,
                    entry: None,
                }
            }
            None => {}
            Some(target) => {
                let entry = grid
                    .legal_moves(position)
                    .map(|(next, _)| next)
                    .find(|&next| partition.region_of(next) == Some(target));
                if entry.is_some() {
                    return LocalStep::Reached { exit: id, entry };
                }
            }
        }
        let chunk = self.chunk;
        relax_neighbors(grid, &self.model, &mut self.context, id, events, |p| {
            chunk.contains(p)
        });
        LocalStep::Running
    }
}

impl PathSearch for HpaSearch<'_> {
    fn step(&mut self, events: &mut Vec<SearchEvent>) -> Progress {
        match self.phase {
            Phase::Abstract { .. } => self.step_abstract(events),
            Phase::Refine(_) => self.step_refine(events),
            Phase::Finished => Progress::Done(SearchOutcome::PathNotFound(
                NotFoundReason::NoPathExists,
            )),
        }
    }

    fn nodes_analyzed(&self) -> usize {
        self.totals.analyzed
            + match &self.phase {
                Phase::Abstract { context, .. } => context.iterations(),
                Phase::Refine(refinement) => refinement.local.context.iterations(),
                Phase::Finished => 0,
            }
    }

    fn nodes_allocated(&self) -> usize {
        self.totals.allocated
            + match &self.phase {
                Phase::Abstract { context, .. } => context.allocated(),
                Phase::Refine(refinement) => refinement.local.context.allocated(),
                Phase::Finished => 0,
            }
    }

    fn memory_estimate(&self) -> usize {
        let current = match &self.phase {
            Phase::Abstract { context, .. } => context.memory_estimate(),
            Phase::Refine(refinement) => {
                refinement.local.context.memory_estimate()
                    + refinement.nodes.capacity() * std::mem::size_of::<Point>()
            }
            Phase::Finished => 0,
        };
        self.totals.peak_memory.max(current)
    }
}
