//! Best-first frontier: a min-priority queue of evaluated nodes.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::node::{FrontierKey, SearchNodeV1};

/// A frontier entry wrapping a node with its ordering key.
///
/// `BinaryHeap` is a max-heap, so we use `Reverse<FrontierKey>` to get
/// min-heap behavior (lowest bound first).
#[derive(Debug)]
struct FrontierEntry<M> {
    key: Reverse<FrontierKey>,
    node: SearchNodeV1<M>,
}

impl<M> PartialEq for FrontierEntry<M> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<M> Eq for FrontierEntry<M> {}

impl<M> PartialOrd for FrontierEntry<M> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<M> Ord for FrontierEntry<M> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Best-first frontier manager.
///
/// Tree nodes are disjoint parameter subsets, so there is no duplicate
/// detection: every pushed node is kept until popped or released.
pub struct BestFirstFrontier<M> {
    heap: BinaryHeap<FrontierEntry<M>>,
    high_water: u64,
}

impl<M> BestFirstFrontier<M> {
    /// Create a new empty frontier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            high_water: 0,
        }
    }

    /// Push a node onto the frontier. The key is taken from its current bound.
    pub fn push(&mut self, node: SearchNodeV1<M>) {
        self.heap.push(FrontierEntry {
            key: Reverse(FrontierKey::from(&node)),
            node,
        });
        let size = self.heap.len() as u64;
        if size > self.high_water {
            self.high_water = size;
        }
    }

    /// Pop the best (lowest bound) node from the frontier.
    #[must_use]
    pub fn pop(&mut self) -> Option<SearchNodeV1<M>> {
        self.heap.pop().map(|e| e.node)
    }

    /// Key of the node [`pop`](Self::pop) would return next.
    #[must_use]
    pub fn peek_key(&self) -> Option<FrontierKey> {
        self.heap.peek().map(|e| e.key.0)
    }

    /// Current frontier size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the frontier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// High-water mark of frontier size.
    #[must_use]
    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    /// Drop every remaining entry. Returns how many were released.
    pub fn release(&mut self) -> u64 {
        let released = self.heap.len() as u64;
        self.heap.clear();
        released
    }
}

impl<M> Default for BestFirstFrontier<M> {
    fn default() -> Self {
        Self::new()
    }
}
