//! Best-first search bookkeeping shared by every strategy.
//!
//! Nodes live in an insertion-ordered map keyed by their position, so the index of an entry
//! is a stable handle for the lifetime of a run. Parent links are such handles; a node only
//! ever gets a parent that was expanded before it, so the links form a chain back to the
//! root and never a cycle. Instead of a decrease-key operation, improved nodes are inserted
//! into the open list again and outdated entries are dropped when popped.
use fxhash::FxBuildHasher;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use std::hash::Hash;

use crate::open_list::OpenList;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Stable handle of a node within one search run.
pub type NodeId = usize;

/// Whether, and how eagerly, an already visited node may be reopened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPolicy {
    pub cost_overwrite: bool,
    /// A candidate replaces the stored cost only if `candidate * error_margin < stored`.
    pub error_margin: f64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        SearchPolicy {
            cost_overwrite: true,
            error_margin: 1.0,
        }
    }
}

impl SearchPolicy {
    pub fn new(cost_overwrite: bool, error_margin: f64) -> SearchPolicy {
        SearchPolicy {
            cost_overwrite,
            error_margin,
        }
    }

    /// Every node is closed for good on its first visit.
    pub fn no_overwrite() -> SearchPolicy {
        SearchPolicy::new(false, 1.0)
    }

    pub fn should_overwrite(&self, candidate: f64, existing: f64) -> bool {
        self.cost_overwrite && candidate * self.error_margin < existing
    }
}

/// A search tree element. `parent` is [None] only for the root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node<N> {
    pub position: N,
    pub cost: f64,
    pub heuristic_cost: f64,
    pub parent: Option<NodeId>,
}

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    cost: f64,
    heuristic_cost: f64,
    parent: Option<NodeId>,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: NodeId,
    cost: f64,
}

/// What [SearchContext::next_node] produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Next {
    /// A node to expand; its entry was current.
    Expand(NodeId),
    /// The open list ran dry.
    Exhausted,
    /// The expansion budget was used up.
    LimitReached,
}

/// Result of offering a successor to the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relaxed {
    /// First visit, a node was allocated.
    Inserted(NodeId),
    /// A visited node got a cheaper cost and parent and was queued again.
    Reopened(NodeId),
    /// The node was already known at an equal or better cost, or reopening is disabled.
    Ignored,
}

impl Relaxed {
    pub fn queued(self) -> Option<NodeId> {
        match self {
            Relaxed::Inserted(id) | Relaxed::Reopened(id) => Some(id),
            Relaxed::Ignored => None,
        }
    }
}

/// Working set of one run: node arena, open list and counters. Created fresh per run and
/// dropped with it.
#[derive(Clone, Debug)]
pub struct SearchContext<N> {
    nodes: FxIndexMap<N, NodeRecord>,
    open: OpenList<OpenEntry>,
    policy: SearchPolicy,
    iteration_limit: usize,
    iterations: usize,
    stale_discarded: usize,
}

impl<N> SearchContext<N>
where
    N: Eq + Hash + Copy,
{
    pub fn new(policy: SearchPolicy, iteration_limit: usize) -> Self {
        SearchContext {
            nodes: FxIndexMap::default(),
            open: OpenList::new(),
            policy,
            iteration_limit,
            iterations: 0,
            stale_discarded: 0,
        }
    }

    /// Allocates the root node at cost zero and queues it.
    pub fn push_root(&mut self, position: N, heuristic_cost: f64) -> NodeId {
        let record = NodeRecord {
            cost: 0.0,
            heuristic_cost,
            parent: None,
        };
        let (id, _) = self.nodes.insert_full(position, record);
        self.open.insert(heuristic_cost, OpenEntry { node: id, cost: 0.0 });
        self.open.reconcile();
        id
    }

    /// Reconciles the open list and pops until a current entry is found. Entries whose cost
    /// no longer matches the stored cost of their node were superseded by a cheaper path and
    /// are dropped without counting towards the iteration limit.
    pub fn next_node(&mut self) -> Next {
        self.open.reconcile();
        loop {
            let Some((_, entry)) = self.open.pop_min() else {
                return Next::Exhausted;
            };
            let Some((_, record)) = self.nodes.get_index(entry.node) else {
                continue;
            };
            if record.cost != entry.cost {
                self.stale_discarded += 1;
                continue;
            }
            if self.iterations >= self.iteration_limit {
                return Next::LimitReached;
            }
            self.iterations += 1;
            return Next::Expand(entry.node);
        }
    }

    /// Offers `position`, reached from `parent` at `cost`, to the search.
    pub fn relax(&mut self, parent: NodeId, position: N, cost: f64, heuristic_cost: f64) -> Relaxed {
        let policy = self.policy;
        let id = match self.nodes.entry(position) {
            Vacant(e) => {
                let id = e.index();
                e.insert(NodeRecord {
                    cost,
                    heuristic_cost,
                    parent: Some(parent),
                });
                self.open.insert(heuristic_cost, OpenEntry { node: id, cost });
                return Relaxed::Inserted(id);
            }
            Occupied(mut e) => {
                let record = e.get_mut();
                // The root keeps its zero cost; nothing can undercut it.
                if record.parent.is_none() || !policy.should_overwrite(cost, record.cost) {
                    return Relaxed::Ignored;
                }
                record.cost = cost;
                record.heuristic_cost = heuristic_cost;
                record.parent = Some(parent);
                e.index()
            }
        };
        trace!("Reopened node {id} at cost {cost}");
        self.open.insert(heuristic_cost, OpenEntry { node: id, cost });
        Relaxed::Reopened(id)
    }

    pub fn reconcile(&mut self) {
        self.open.reconcile();
    }

    pub fn node(&self, id: NodeId) -> Option<Node<N>> {
        self.nodes.get_index(id).map(|(&position, record)| Node {
            position,
            cost: record.cost,
            heuristic_cost: record.heuristic_cost,
            parent: record.parent,
        })
    }

    /// Node behind a handle returned by this context. Panics on handles from another run.
    pub fn get(&self, id: NodeId) -> Node<N> {
        match self.node(id) {
            Some(node) => node,
            None => panic!("node handle {id} does not belong to this search"),
        }
    }

    pub fn position(&self, id: NodeId) -> Option<N> {
        self.nodes.get_index(id).map(|(&position, _)| position)
    }

    pub fn parent_position(&self, id: NodeId) -> Option<N> {
        self.nodes
            .get_index(id)
            .and_then(|(_, record)| record.parent)
            .and_then(|parent| self.position(parent))
    }

    /// Positions from the root to `id`, following parent links.
    pub fn path_to(&self, id: NodeId) -> Vec<N> {
        let mut path: Vec<N> = std::iter::successors(Some(id), |&current| {
            self.nodes.get_index(current).and_then(|(_, record)| record.parent)
        })
        .filter_map(|current| self.position(current))
        .collect();
        path.reverse();
        path
    }

    /// Number of nodes expanded so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn iteration_limit(&self) -> usize {
        self.iteration_limit
    }

    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    pub fn stale_discarded(&self) -> usize {
        self.stale_discarded
    }

    /// Rough size of the working set: allocated node slots plus the open list.
    pub fn memory_estimate(&self) -> usize {
        self.nodes.capacity() * (std::mem::size_of::<N>() + std::mem::size_of::<NodeRecord>())
            + self.open.memory_estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_cheapest_first_and_reports_exhaustion() {
        let mut ctx: SearchContext<u32> = SearchContext::new(SearchPolicy::default(), 100);
        let root = ctx.push_root(0, 0.0);
        assert_eq!(ctx.next_node(), Next::Expand(root));
        let b = ctx.relax(root, 2, 2.0, 2.0).queued().unwrap();
        let a = ctx.relax(root, 1, 1.0, 1.0).queued().unwrap();
        assert_eq!(ctx.next_node(), Next::Expand(a));
        assert_eq!(ctx.next_node(), Next::Expand(b));
        assert_eq!(ctx.next_node(), Next::Exhausted);
        assert_eq!(ctx.iterations(), 3);
        assert_eq!(ctx.allocated(), 3);
    }

    #[test]
    fn overwrite_reparents_and_discards_stale_entry() {
        let mut ctx: SearchContext<u32> = SearchContext::new(SearchPolicy::default(), 100);
        let root = ctx.push_root(0, 0.0);
        ctx.next_node();
        let far = ctx.relax(root, 9, 10.0, 10.0).queued().unwrap();
        let near = ctx.relax(root, 1, 1.0, 1.0).queued().unwrap();
        assert_eq!(ctx.next_node(), Next::Expand(near));
        assert_eq!(ctx.relax(near, 9, 3.0, 3.0), Relaxed::Reopened(far));
        assert_eq!(ctx.node(far).unwrap().parent, Some(near));
        assert_eq!(ctx.next_node(), Next::Expand(far));
        // The entry queued at cost 10 is stale now.
        assert_eq!(ctx.next_node(), Next::Exhausted);
        assert_eq!(ctx.stale_discarded(), 1);
        assert_eq!(ctx.path_to(far), vec![0, 1, 9]);
    }

    #[test]
    fn error_margin_limits_reopening() {
        let policy = SearchPolicy::new(true, 1.5);
        assert!(!policy.should_overwrite(8.0, 10.0));
        assert!(policy.should_overwrite(6.0, 10.0));
        assert!(!SearchPolicy::no_overwrite().should_overwrite(0.0, 10.0));

        let mut ctx: SearchContext<u32> = SearchContext::new(policy, 100);
        let root = ctx.push_root(0, 0.0);
        ctx.next_node();
        let id = ctx.relax(root, 5, 10.0, 10.0).queued().unwrap();
        assert_eq!(ctx.relax(root, 5, 8.0, 8.0), Relaxed::Ignored);
        assert_eq!(ctx.relax(root, 5, 6.0, 6.0), Relaxed::Reopened(id));
        // The root is never reopened.
        assert_eq!(ctx.relax(id, 0, 0.0, 0.0), Relaxed::Ignored);
    }

    #[test]
    fn iteration_limit_aborts() {
        let mut ctx: SearchContext<u32> = SearchContext::new(SearchPolicy::default(), 1);
        let root = ctx.push_root(0, 0.0);
        assert_eq!(ctx.next_node(), Next::Expand(root));
        ctx.relax(root, 1, 1.0, 1.0);
        assert_eq!(ctx.next_node(), Next::LimitReached);
    }
}
