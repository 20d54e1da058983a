//! Branch model contract.

use crate::bound::Bound;

/// A subset of the parameter space that the search can bisect and bound.
///
/// Implementations are the concrete energy models. The search owns every
/// node it creates; a model never sees its own bound.
///
/// # Contract
///
/// - `branch_further` returns two disjoint children whose union is `self`'s
///   parameter space, and must eventually reach `is_leaf() == true` along
///   every path.
/// - For a leaf, `unary_costs` + `constant_term` describe one fully
///   determined energy, so the leaf's bound equals its true minimum energy.
/// - For an inner node, every unary cost must be ≤ the same pixel's cost in
///   every leaf below it, and `constant_term` must be ≤ every leaf's
///   constant. This makes child bounds ≥ parent bounds.
/// - `clone` is a deep copy: the clone shares no mutable state with `self`.
pub trait BranchModel: Clone {
    /// True iff the parameter space is a single point.
    fn is_leaf(&self) -> bool;

    /// Bisect into two disjoint, space-covering children.
    fn branch_further(&self) -> (Self, Self);

    /// Per-pixel terminal costs. Both slices have one entry per pixel and
    /// arrive zeroed; the model overwrites every entry.
    fn unary_costs(&self, background: &mut [i64], foreground: &mut [i64]);

    /// Bound-independent additive offset. `PosInfinity` marks the node infeasible.
    ///
    /// `NegInfinity` is not an energy: the evaluator treats it exactly like
    /// [`skip_evaluation`](Self::skip_evaluation) returning true, so such a
    /// leaf can never become the best solution.
    fn constant_term(&self) -> Bound {
        Bound::ZERO
    }

    /// If true, the node's bound is `NegInfinity` without running a cut.
    fn skip_evaluation(&self) -> bool {
        false
    }

    /// Cheap model-specific hint that the node is not worth evaluating.
    ///
    /// Only consulted when the policy opts in via
    /// [`crate::policy::PruneHintPolicyV1::DiscardBeforeEvaluation`].
    fn should_prune(&self) -> bool {
        false
    }

    /// Parameter description recorded for the best node in the search trace.
    ///
    /// Must contain integers only (the trace is canonical JSON).
    fn describe(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
