//! Engine-owned search node wrapper.

use crate::bound::Bound;

/// A node of the branch-and-bound tree.
///
/// The engine wraps every model instance it creates so that identity, depth
/// and bound live outside the model. Ordering for frontier extraction uses
/// `(bound, depth, creation_order)`: lower bound first, ties broken by
/// shallower depth, then older creation order.
///
/// Ownership is single and explicit: a node lives on the frontier, on the
/// depth-first work stack, or in the best-solution slot, never in two places.
/// `Clone` is a deep copy and carries the bound with it.
#[derive(Debug, Clone)]
pub struct SearchNodeV1<M> {
    /// Identifier assigned by the search context, unique per search.
    pub node_id: u64,
    /// Parent node ID (`None` for the root and the initial guess).
    pub parent_id: Option<u64>,
    /// Tree depth (root = 0).
    pub depth: u32,
    /// Global counter for deterministic tie-breaking.
    pub creation_order: u64,
    /// The model-specific parameter subset.
    pub model: M,
    bound: Option<Bound>,
}

impl<M> SearchNodeV1<M> {
    pub(crate) fn new(node_id: u64, parent_id: Option<u64>, depth: u32, model: M) -> Self {
        Self {
            node_id,
            parent_id,
            depth,
            creation_order: node_id,
            model,
            bound: None,
        }
    }

    /// The bound set by the evaluator, or `None` before evaluation.
    #[must_use]
    pub fn bound(&self) -> Option<Bound> {
        self.bound
    }

    pub(crate) fn set_bound(&mut self, bound: Bound) {
        self.bound = Some(bound);
    }

    /// Consume the wrapper and hand the model to the caller.
    #[must_use]
    pub fn into_model(self) -> M {
        self.model
    }
}

/// The frontier ordering key: `(bound, depth, creation_order)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierKey {
    pub bound: Bound,
    pub depth: u32,
    pub creation_order: u64,
}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bound
            .cmp(&other.bound)
            .then(self.depth.cmp(&other.depth))
            .then(self.creation_order.cmp(&other.creation_order))
    }
}

impl<M> From<&SearchNodeV1<M>> for FrontierKey {
    /// An unevaluated node sorts as `NegInfinity`: nothing is known against it.
    fn from(node: &SearchNodeV1<M>) -> Self {
        Self {
            bound: node.bound.unwrap_or(Bound::NegInfinity),
            depth: node.depth,
            creation_order: node.creation_order,
        }
    }
}
