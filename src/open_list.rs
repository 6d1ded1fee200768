//! Cost-ordered worklist with batched insertion.
//!
//! Freshly inserted entries land in an unordered pending buffer and are only merged into the
//! sorted sequence by [OpenList::reconcile]. A search expands one node, inserts all of its
//! successors and reconciles once, so the ordering work is paid once per expansion instead of
//! once per successor.
use std::collections::VecDeque;

#[derive(Clone, Debug)]
struct Ranked<T> {
    priority: f64,
    item: T,
}

#[derive(Clone, Debug)]
pub struct OpenList<T> {
    settled: VecDeque<Ranked<T>>,
    pending: Vec<Ranked<T>>,
}

impl<T> Default for OpenList<T> {
    fn default() -> Self {
        OpenList {
            settled: VecDeque::new(),
            pending: Vec::new(),
        }
    }
}

impl<T> OpenList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the pending buffer in O(1).
    pub fn insert(&mut self, priority: f64, item: T) {
        self.pending.push(Ranked { priority, item });
    }

    /// Moves every pending entry into the settled sequence with a binary search. Entries with
    /// equal priority keep their insertion order.
    pub fn reconcile(&mut self) {
        for entry in self.pending.drain(..) {
            let at = self
                .settled
                .partition_point(|settled| settled.priority <= entry.priority);
            self.settled.insert(at, entry);
        }
    }

    /// Removes the lowest-priority settled entry. Pending entries are not considered, so
    /// callers reconcile first whenever something was inserted since the last reconcile.
    pub fn pop_min(&mut self) -> Option<(f64, T)> {
        debug_assert!(
            !(self.settled.is_empty() && !self.pending.is_empty()),
            "pop_min called with unreconciled entries"
        );
        self.settled
            .pop_front()
            .map(|entry| (entry.priority, entry.item))
    }

    pub fn peek_min(&self) -> Option<(f64, &T)> {
        self.settled
            .front()
            .map(|entry| (entry.priority, &entry.item))
    }

    pub fn len(&self) -> usize {
        self.settled.len() + self.pending.len()
    }

    pub fn settled_len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty() && self.pending.is_empty()
    }

    pub fn is_reconciled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Priorities of the settled sequence, front to back.
    pub fn settled_priorities(&self) -> impl Iterator<Item = f64> + '_ {
        self.settled.iter().map(|entry| entry.priority)
    }

    /// Capacity-based size of both partitions.
    pub fn memory_estimate(&self) -> usize {
        (self.settled.capacity() + self.pending.capacity()) * std::mem::size_of::<Ranked<T>>()
    }
}
