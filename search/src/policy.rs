//! Search policy types.

use crate::error::SearchError;

/// Strategy, budget and prune-hint configuration for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicyV1 {
    /// Best-first (certifies the first popped leaf) or depth-first with pruning.
    pub strategy: StrategyV1,
    /// Hard cap on bound evaluations, checked before each expansion. Popping
    /// a leaf or pruning a node needs no evaluation and is never blocked.
    ///
    /// The trace keeps one `Evaluated` event per evaluation and is held in
    /// memory until the search returns, so this also caps the trace: roughly
    /// 100 bytes per event once serialized, about 100 MB at the default.
    pub max_evaluations: u64,
    /// Whether the model's early-rejection hint is consulted.
    pub prune_hint: PruneHintPolicyV1,
}

impl SearchPolicyV1 {
    /// Validate that this policy can drive a search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPolicy`] if the evaluation budget is zero
    /// (the root itself could not be evaluated).
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_evaluations == 0 {
            return Err(SearchError::InvalidPolicy {
                detail: "max_evaluations must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for SearchPolicyV1 {
    fn default() -> Self {
        Self {
            strategy: StrategyV1::BestFirst,
            max_evaluations: 1_000_000,
            prune_hint: PruneHintPolicyV1::Ignore,
        }
    }
}

/// Tree traversal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyV1 {
    /// Min-bound frontier; stops at the first leaf popped.
    BestFirst,
    /// Nearer child first; a sibling is visited only while it can still improve.
    DepthFirst,
}

impl StrategyV1 {
    /// Stable name used in traces and config snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BestFirst => "best_first",
            Self::DepthFirst => "depth_first",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "best_first" => Some(Self::BestFirst),
            "depth_first" => Some(Self::DepthFirst),
            _ => None,
        }
    }
}

/// How [`crate::contract::BranchModel::should_prune`] is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneHintPolicyV1 {
    /// The hint is never consulted. Default.
    Ignore,
    /// Children whose hint fires are dropped before their bound is evaluated.
    ///
    /// Only sound if the model guarantees the hinted subtree cannot contain
    /// the optimum.
    DiscardBeforeEvaluation,
}

impl PruneHintPolicyV1 {
    /// Stable name used in traces and config snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::DiscardBeforeEvaluation => "discard_before_evaluation",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ignore" => Some(Self::Ignore),
            "discard_before_evaluation" => Some(Self::DiscardBeforeEvaluation),
            _ => None,
        }
    }
}
