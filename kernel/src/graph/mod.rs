//! The min-cut collaborator consumed by the search engine.
//!
//! The engine only ever talks to a [`CutGraph`]: it builds the grid topology
//! once, then repeatedly edits terminal capacities and re-solves. Any
//! max-flow that preserves its residual state across solves can sit behind
//! this trait; [`residual::ResidualGraph`] is the one shipped here.

pub mod residual;

/// Which terminal side a node ended up on after the last solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Source side. The node pays its sink capacity.
    Source,
    /// Sink side. The node pays its source capacity.
    Sink,
}

/// A mutable s-t graph supporting incremental edits and warm-started re-solves.
///
/// # Contract
///
/// - `reset` discards all nodes, edges, terminal capacities and accumulated flow.
/// - Terminal capacities are additive: two calls with `(a, b)` and `(c, d)`
///   equal one call with `(a + c, b + d)`. Deltas may be negative as long as
///   the accumulated capacities would stay non-negative.
/// - `maxflow` returns the value of the minimum cut for the capacities
///   accumulated since `reset`, regardless of `reuse_trees`.
/// - With `reuse_trees`, the solver may rely on `mark_node` having been called
///   for every node whose terminal capacities changed since the last solve.
pub trait CutGraph {
    /// Discard everything and allocate `node_count` nodes, reserving room for
    /// `edge_capacity` undirected edges.
    fn reset(&mut self, node_count: usize, edge_capacity: usize);

    /// Number of nodes allocated by the last `reset`.
    fn node_count(&self) -> usize;

    /// Add an edge `i → j` with `capacity` and `j → i` with `reverse_capacity`.
    fn add_edge(&mut self, i: usize, j: usize, capacity: i64, reverse_capacity: i64);

    /// Add `source_capacity` to `s → i` and `sink_capacity` to `i → t`.
    fn add_terminal_weights(&mut self, i: usize, source_capacity: i64, sink_capacity: i64);

    /// Record that node `i` changed since the last solve.
    fn mark_node(&mut self, i: usize);

    /// Solve for the minimum cut, optionally reusing state from the last solve.
    fn maxflow(&mut self, reuse_trees: bool) -> i64;

    /// Side of node `i` in the cut found by the last `maxflow`.
    fn segment(&self, i: usize) -> Segment;
}
