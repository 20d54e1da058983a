//! Search entry point and the two traversal strategies.

use std::panic::{catch_unwind, AssertUnwindSafe};

use branchcut_kernel::graph::CutGraph;
use branchcut_kernel::grid::{pack_labels, Label, PairwiseGrid};
use branchcut_kernel::proof::hash::canonical_hash;
use branchcut_kernel::proof::hash_domain::HashDomain;

use crate::bound::Bound;
use crate::context::{BestSolutionV1, PreparedGraph, SearchContext};
use crate::contract::BranchModel;
use crate::error::SearchError;
use crate::frontier::BestFirstFrontier;
use crate::node::SearchNodeV1;
use crate::policy::{SearchPolicyV1, StrategyV1};
use crate::trace::{PanicStageV1, SearchTraceMetadata, SearchTraceV1, TerminationReasonV1};

/// Result of a search execution.
///
/// Always contains a complete `SearchTraceV1` audit trail regardless of how
/// the search terminated. Check [`SearchResult::is_optimal`] or inspect
/// `trace.metadata.termination_reason` to determine the outcome.
#[derive(Debug)]
pub struct SearchResult<M> {
    /// The best leaf found and its labeling, owned by the caller.
    pub best: Option<BestSolutionV1<M>>,
    /// The complete search audit trail.
    pub trace: SearchTraceV1,
    /// Bound evaluations performed.
    pub evaluations: u64,
}

impl<M> SearchResult<M> {
    /// `true` if the search ran to completion and found a leaf, so the best
    /// record is the global optimum.
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.best.is_some()
            && matches!(
                self.trace.metadata.termination_reason,
                TerminationReasonV1::OptimumPopped { .. } | TerminationReasonV1::TreeExhausted
            )
    }

    /// Bound of the best leaf.
    #[must_use]
    pub fn best_bound(&self) -> Option<Bound> {
        self.best.as_ref().and_then(|b| b.node.bound())
    }

    /// Labeling of the best leaf.
    #[must_use]
    pub fn labeling(&self) -> Option<&[Label]> {
        self.best.as_ref().map(|b| b.labeling.as_slice())
    }
}

/// What a strategy reports back besides the context it mutated.
struct StrategyOutcome {
    termination: TerminationReasonV1,
    frontier_high_water: u64,
    stack_high_water: u64,
    released: u64,
}

/// Run branch-and-bound from `root` over the grid `prepared` was sized for.
///
/// `unary_bias` is a position-dependent, node-independent unary term added
/// once during graph setup: a positive value makes foreground more expensive,
/// a negative one background. `initial_guess` seeds the upper bound for
/// depth-first search; best-first ignores it.
///
/// All runtime terminations (caught panics, budget exhaustion, defective
/// node models) return `Ok(SearchResult)` with the trace preserved.
///
/// # Errors
///
/// Pre-flight only, no search step is taken:
/// - [`SearchError::InvalidPolicy`] from [`SearchPolicyV1::validate`].
/// - [`SearchError::DimensionMismatch`] if `pairwise` does not match `prepared`.
/// - [`SearchError::Grid`] if `unary_bias` has the wrong length.
/// - [`SearchError::InitialGuessNotLeaf`] for a depth-first guess that is not a leaf.
pub fn search<M: BranchModel, G: CutGraph>(
    prepared: &mut PreparedGraph<G>,
    pairwise: &PairwiseGrid,
    unary_bias: Option<&[i64]>,
    root: M,
    initial_guess: Option<M>,
    policy: &SearchPolicyV1,
) -> Result<SearchResult<M>, SearchError> {
    policy.validate()?;
    let initial_guess = match policy.strategy {
        StrategyV1::DepthFirst => initial_guess,
        StrategyV1::BestFirst => None,
    };
    if initial_guess.as_ref().is_some_and(|g| !g.is_leaf()) {
        return Err(SearchError::InitialGuessNotLeaf);
    }

    let dims = prepared.dims();
    let mut ctx = SearchContext::begin(prepared, pairwise, unary_bias)?
        .with_prune_hint(policy.prune_hint);

    let mut initial_guess_node_id = None;
    let outcome = 'run: {
        if let Some(guess) = initial_guess {
            let mut node = ctx.root_node(guess);
            initial_guess_node_id = Some(node.node_id);
            if let Err(stage) = ctx.evaluate(&mut node) {
                break 'run StrategyOutcome::panicked(stage);
            }
        }

        let mut root = ctx.root_node(root);
        if let Err(stage) = ctx.evaluate(&mut root) {
            break 'run StrategyOutcome::panicked(stage);
        }

        match policy.strategy {
            StrategyV1::BestFirst => best_first(&mut ctx, root, policy),
            StrategyV1::DepthFirst => depth_first(&mut ctx, root, policy),
        }
    };

    let best_labeling_digest = ctx
        .best
        .as_ref()
        .map(|b| canonical_hash(HashDomain::Labeling, &pack_labels(&b.labeling)));
    let metadata = SearchTraceMetadata {
        strategy: policy.strategy,
        width: dims.width,
        height: dims.height,
        max_evaluations: policy.max_evaluations,
        prune_hint: policy.prune_hint,
        initial_guess_node_id,
        total_evaluations: ctx.evaluations,
        total_solves: ctx.solves,
        total_terminal_edits: ctx.terminal_edits,
        total_expansions: ctx.expansions,
        total_pruned: ctx.pruned,
        total_discarded: ctx.discarded,
        frontier_high_water: outcome.frontier_high_water,
        stack_high_water: outcome.stack_high_water,
        released_on_termination: outcome.released,
        best_node_id: ctx.best.as_ref().map(|b| b.node.node_id),
        best_bound: ctx.upper_bound,
        best_parameters: ctx
            .best
            .as_ref()
            .map_or(serde_json::Value::Null, |b| b.node.model.describe()),
        best_labeling_digest,
        termination_reason: outcome.termination,
    };

    Ok(SearchResult {
        evaluations: ctx.evaluations,
        best: ctx.best,
        trace: SearchTraceV1 {
            events: ctx.events,
            metadata,
        },
    })
}

impl StrategyOutcome {
    fn panicked(stage: PanicStageV1) -> Self {
        Self {
            termination: TerminationReasonV1::InternalPanic { stage },
            frontier_high_water: 0,
            stack_high_water: 0,
            released: 0,
        }
    }
}

/// Bisect `node` and evaluate both children. Children dropped by the prune
/// hint are not returned.
fn expand<M: BranchModel, G: CutGraph>(
    ctx: &mut SearchContext<'_, M, G>,
    node: &SearchNodeV1<M>,
) -> Result<Vec<SearchNodeV1<M>>, PanicStageV1> {
    let halves = catch_unwind(AssertUnwindSafe(|| node.model.branch_further()))
        .map_err(|_| PanicStageV1::BranchFurther)?;
    let mut kept = Vec::with_capacity(2);
    for mut child in ctx.child_nodes(node, halves) {
        if ctx.discard_by_hint(&mut child) {
            continue;
        }
        ctx.evaluate(&mut child)?;
        kept.push(child);
    }
    Ok(kept)
}

/// Pop the minimum-bound node until a leaf surfaces.
fn best_first<M: BranchModel, G: CutGraph>(
    ctx: &mut SearchContext<'_, M, G>,
    root: SearchNodeV1<M>,
    policy: &SearchPolicyV1,
) -> StrategyOutcome {
    let mut frontier = BestFirstFrontier::new();
    frontier.push(root);

    let termination = loop {
        let Some(node) = frontier.pop() else {
            break TerminationReasonV1::FrontierExhausted;
        };
        if node.model.is_leaf() {
            // Every other frontier node has a bound ≥ this one.
            break if node.bound() == Some(Bound::NegInfinity) {
                TerminationReasonV1::UnevaluatedLeaf {
                    node_id: node.node_id,
                }
            } else {
                TerminationReasonV1::OptimumPopped {
                    node_id: node.node_id,
                }
            };
        }
        if ctx.evaluations >= policy.max_evaluations {
            frontier.push(node);
            break TerminationReasonV1::EvaluationBudgetExceeded;
        }
        match expand(ctx, &node) {
            Ok(children) => {
                for child in children {
                    frontier.push(child);
                }
            }
            Err(stage) => break TerminationReasonV1::InternalPanic { stage },
        }
    };

    StrategyOutcome {
        termination,
        frontier_high_water: frontier.high_water(),
        stack_high_water: 0,
        released: frontier.release(),
    }
}

/// Nearer child first; the sibling only while it can still beat the upper bound.
///
/// The work stack replaces recursion: the deferred sibling is pushed below
/// the nearer child, and the bound test happens when a node is popped, after
/// the nearer subtree has had its chance to tighten the upper bound.
fn depth_first<M: BranchModel, G: CutGraph>(
    ctx: &mut SearchContext<'_, M, G>,
    root: SearchNodeV1<M>,
    policy: &SearchPolicyV1,
) -> StrategyOutcome {
    let root_id = root.node_id;
    let mut stack = vec![root];
    let mut stack_high_water: u64 = 1;

    let termination = loop {
        let Some(node) = stack.pop() else {
            break TerminationReasonV1::TreeExhausted;
        };
        let bound = node.bound().unwrap_or(Bound::NegInfinity);
        if node.node_id != root_id && bound >= ctx.upper_bound {
            ctx.record_pruned(&node);
            continue;
        }
        if node.model.is_leaf() {
            // Already scored, and recorded if it improved.
            continue;
        }
        if ctx.evaluations >= policy.max_evaluations {
            stack.push(node);
            break TerminationReasonV1::EvaluationBudgetExceeded;
        }
        let mut children = match expand(ctx, &node) {
            Ok(children) => children,
            Err(stage) => break TerminationReasonV1::InternalPanic { stage },
        };
        drop(node);
        // Strictly smaller bound goes first; on a tie the second child does.
        if let [first, second] = children.as_slice() {
            if first.bound() < second.bound() {
                children.swap(0, 1);
            }
        }
        stack.extend(children);
        stack_high_water = stack_high_water.max(stack.len() as u64);
    };

    StrategyOutcome {
        termination,
        frontier_high_water: 0,
        stack_high_water,
        released: stack.len() as u64,
    }
}
