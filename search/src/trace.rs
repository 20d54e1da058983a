//! `SearchTraceV1`: evaluation-event audit log.
//!
//! The normative decision surface is the ordered list of [`SearchEventV1`]
//! entries. Metadata aggregates counters, the policy echo and the
//! termination reason. Identical inputs produce byte-identical canonical JSON.

use branchcut_kernel::proof::canon::{canonical_json_bytes, CanonError};
use branchcut_kernel::proof::hash::{canonical_hash, ContentHash};
use branchcut_kernel::proof::hash_domain::HashDomain;

use crate::bound::Bound;
use crate::policy::{PruneHintPolicyV1, StrategyV1};

/// The complete search audit trail.
#[derive(Debug, Clone)]
pub struct SearchTraceV1 {
    /// Ordered events (normative decision surface).
    pub events: Vec<SearchEventV1>,
    /// Aggregate metadata.
    pub metadata: SearchTraceMetadata,
}

/// One engine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEventV1 {
    /// A node's bound was set.
    Evaluated {
        node_id: u64,
        parent_id: Option<u64>,
        depth: u32,
        bound: Bound,
        outcome: EvaluationOutcomeV1,
        /// The node became the new best leaf.
        improved: bool,
    },
    /// A node was bisected; `children` are the two new node ids in creation order.
    Expanded {
        node_id: u64,
        bound: Bound,
        children: [u64; 2],
    },
    /// Depth-first skipped a subtree whose bound cannot beat the upper bound.
    Pruned {
        node_id: u64,
        bound: Bound,
        upper_bound: Bound,
    },
}

/// How a node's bound was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcomeV1 {
    /// Terminal deltas applied and the cut re-solved.
    Solved,
    /// The model asked to skip evaluation or returned a `NegInfinity`
    /// offset; bound is `NegInfinity`.
    Skipped,
    /// The constant term alone exceeds the upper bound; no cut was run.
    Dominated,
    /// The model's prune hint fired and the policy honours it; no cut was run.
    DiscardedByHint,
}

/// Aggregate metadata.
#[derive(Debug, Clone)]
pub struct SearchTraceMetadata {
    // Inputs
    pub strategy: StrategyV1,
    pub width: usize,
    pub height: usize,
    pub max_evaluations: u64,
    pub prune_hint: PruneHintPolicyV1,
    /// Node id of the depth-first initial guess, if one was evaluated.
    pub initial_guess_node_id: Option<u64>,

    // Counters
    pub total_evaluations: u64,
    pub total_solves: u64,
    pub total_terminal_edits: u64,
    pub total_expansions: u64,
    pub total_pruned: u64,
    pub total_discarded: u64,
    pub frontier_high_water: u64,
    pub stack_high_water: u64,
    /// Frontier or stack entries dropped when the search stopped.
    pub released_on_termination: u64,

    // Outcome
    pub best_node_id: Option<u64>,
    pub best_bound: Bound,
    pub best_parameters: serde_json::Value,
    pub best_labeling_digest: Option<ContentHash>,
    pub termination_reason: TerminationReasonV1,
}

/// Why the search terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReasonV1 {
    /// Best-first popped a leaf: its bound is the global optimum.
    OptimumPopped { node_id: u64 },
    /// Depth-first visited or pruned every subtree.
    TreeExhausted,
    /// Best-first ran out of nodes without popping a leaf. The node model
    /// never reaches a leaf along some path.
    FrontierExhausted,
    /// `max_evaluations` was hit; the best record is not certified.
    EvaluationBudgetExceeded,
    /// Best-first popped a leaf whose evaluation was skipped, so its bound
    /// says nothing about its energy.
    UnevaluatedLeaf { node_id: u64 },
    /// A panic was caught in a model callback.
    InternalPanic { stage: PanicStageV1 },
}

/// Model callback in which a panic was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicStageV1 {
    /// `BranchModel::branch_further()` panicked.
    BranchFurther,
    /// `BranchModel::unary_costs()` panicked.
    UnaryCosts,
}

// ---------------------------------------------------------------------------
// Canonical JSON serialization
// ---------------------------------------------------------------------------

impl SearchTraceV1 {
    /// Serialize the trace to canonical JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if the best node's parameter description holds
    /// a non-integer number.
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Content hash of the canonical JSON under [`HashDomain::SearchTrace`].
    ///
    /// # Errors
    ///
    /// Same as [`to_canonical_json_bytes`](Self::to_canonical_json_bytes).
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = self.to_canonical_json_bytes()?;
        Ok(canonical_hash(HashDomain::SearchTrace, &bytes))
    }

    /// The trace as a JSON value (keys not yet sorted).
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "events": self.events.iter().map(event_to_json).collect::<Vec<_>>(),
            "metadata": metadata_to_json(&self.metadata),
        })
    }
}

fn event_to_json(e: &SearchEventV1) -> serde_json::Value {
    match e {
        SearchEventV1::Evaluated {
            node_id,
            parent_id,
            depth,
            bound,
            outcome,
            improved,
        } => serde_json::json!({
            "bound": bound.to_json(),
            "depth": depth,
            "improved": improved,
            "node_id": node_id,
            "outcome": outcome_str(*outcome),
            "parent_id": parent_id,
            "type": "evaluated",
        }),
        SearchEventV1::Expanded {
            node_id,
            bound,
            children,
        } => serde_json::json!({
            "bound": bound.to_json(),
            "children": children,
            "node_id": node_id,
            "type": "expanded",
        }),
        SearchEventV1::Pruned {
            node_id,
            bound,
            upper_bound,
        } => serde_json::json!({
            "bound": bound.to_json(),
            "node_id": node_id,
            "type": "pruned",
            "upper_bound": upper_bound.to_json(),
        }),
    }
}

fn outcome_str(o: EvaluationOutcomeV1) -> &'static str {
    match o {
        EvaluationOutcomeV1::Solved => "solved",
        EvaluationOutcomeV1::Skipped => "skipped",
        EvaluationOutcomeV1::Dominated => "dominated",
        EvaluationOutcomeV1::DiscardedByHint => "discarded_by_hint",
    }
}

fn metadata_to_json(m: &SearchTraceMetadata) -> serde_json::Value {
    serde_json::json!({
        "best_bound": m.best_bound.to_json(),
        "best_labeling_digest": m.best_labeling_digest.as_ref().map(ContentHash::as_str),
        "best_node_id": m.best_node_id,
        "best_parameters": m.best_parameters,
        "frontier_high_water": m.frontier_high_water,
        "height": m.height,
        "initial_guess_node_id": m.initial_guess_node_id,
        "max_evaluations": m.max_evaluations,
        "prune_hint": m.prune_hint.as_str(),
        "released_on_termination": m.released_on_termination,
        "stack_high_water": m.stack_high_water,
        "strategy": m.strategy.as_str(),
        "termination_reason": termination_reason_to_json(&m.termination_reason),
        "total_discarded": m.total_discarded,
        "total_evaluations": m.total_evaluations,
        "total_expansions": m.total_expansions,
        "total_pruned": m.total_pruned,
        "total_solves": m.total_solves,
        "total_terminal_edits": m.total_terminal_edits,
        "width": m.width,
    })
}

fn termination_reason_to_json(r: &TerminationReasonV1) -> serde_json::Value {
    match r {
        TerminationReasonV1::OptimumPopped { node_id } => {
            serde_json::json!({"node_id": node_id, "type": "optimum_popped"})
        }
        TerminationReasonV1::TreeExhausted => serde_json::json!({"type": "tree_exhausted"}),
        TerminationReasonV1::FrontierExhausted => serde_json::json!({"type": "frontier_exhausted"}),
        TerminationReasonV1::EvaluationBudgetExceeded => {
            serde_json::json!({"type": "evaluation_budget_exceeded"})
        }
        TerminationReasonV1::UnevaluatedLeaf { node_id } => {
            serde_json::json!({"node_id": node_id, "type": "unevaluated_leaf"})
        }
        TerminationReasonV1::InternalPanic { stage } => {
            serde_json::json!({"stage": panic_stage_str(*stage), "type": "internal_panic"})
        }
    }
}

fn panic_stage_str(s: PanicStageV1) -> &'static str {
    match s {
        PanicStageV1::BranchFurther => "branch_further",
        PanicStageV1::UnaryCosts => "unary_costs",
    }
}
