//! Lock tests for rejected inputs and defective node models: pre-flight
//! errors carry no trace, runtime defects terminate with a distinct reason
//! and a complete trace.

use branchcut_kernel::grid::{GridDims, GridError, PairwiseGrid};
use branchcut_search::trace::PanicStageV1;
use branchcut_search::{
    search, BranchModel, PreparedGraph, PruneHintPolicyV1, SearchContext, SearchError,
    SearchPolicyV1, StrategyV1, TerminationReasonV1,
};
use lock_tests::table_model::TableModel;

fn policy(strategy: StrategyV1) -> SearchPolicyV1 {
    SearchPolicyV1 {
        strategy,
        ..SearchPolicyV1::default()
    }
}

/// Splits forever; every node is hinted as prunable.
#[derive(Clone)]
struct Hopeless;

impl BranchModel for Hopeless {
    fn is_leaf(&self) -> bool {
        false
    }
    fn branch_further(&self) -> (Self, Self) {
        (Hopeless, Hopeless)
    }
    fn unary_costs(&self, background: &mut [i64], _foreground: &mut [i64]) {
        background.fill(1);
    }
    fn should_prune(&self) -> bool {
        true
    }
}

/// A leaf whose bound is never computed.
#[derive(Clone)]
struct Opaque;

impl BranchModel for Opaque {
    fn is_leaf(&self) -> bool {
        true
    }
    fn branch_further(&self) -> (Self, Self) {
        (Opaque, Opaque)
    }
    fn unary_costs(&self, _background: &mut [i64], _foreground: &mut [i64]) {}
    fn skip_evaluation(&self) -> bool {
        true
    }
}

/// Writes past the end of the cost buffers.
#[derive(Clone)]
struct Overrun;

impl BranchModel for Overrun {
    fn is_leaf(&self) -> bool {
        true
    }
    fn branch_further(&self) -> (Self, Self) {
        (Overrun, Overrun)
    }
    fn unary_costs(&self, background: &mut [i64], _foreground: &mut [i64]) {
        let past_end = background.len();
        background[past_end] = 1;
    }
}

#[test]
fn dimension_mismatch_rejected_before_search() {
    let mut prepared = PreparedGraph::prepare(GridDims::new(2, 2).unwrap());
    let pairwise = PairwiseGrid::zero(GridDims::new(4, 1).unwrap());
    let root = TableModel::random(1, 4, 3, 10);
    let err = search(
        &mut prepared,
        &pairwise,
        None,
        root.clone(),
        None,
        &policy(StrategyV1::BestFirst),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SearchError::DimensionMismatch {
            prepared: GridDims::new(2, 2).unwrap(),
            requested: GridDims::new(4, 1).unwrap(),
        }
    );
    assert!(SearchContext::<TableModel>::begin(&mut prepared, &pairwise, None).is_err());
}

#[test]
fn bias_length_mismatch_rejected_before_search() {
    let dims = GridDims::new(3, 1).unwrap();
    let mut prepared = PreparedGraph::prepare(dims);
    let pairwise = PairwiseGrid::zero(dims);
    let err = search(
        &mut prepared,
        &pairwise,
        Some(&[1, 2]),
        TableModel::random(2, 3, 3, 10),
        None,
        &policy(StrategyV1::DepthFirst),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SearchError::Grid(GridError::BiasCountMismatch {
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn zero_budget_rejected_as_invalid_policy() {
    let dims = GridDims::new(1, 1).unwrap();
    let mut prepared = PreparedGraph::prepare(dims);
    let err = search(
        &mut prepared,
        &PairwiseGrid::zero(dims),
        None,
        TableModel::random(3, 1, 2, 10),
        None,
        &SearchPolicyV1 {
            max_evaluations: 0,
            ..SearchPolicyV1::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::InvalidPolicy { .. }));
}

#[test]
fn frontier_exhaustion_is_distinct_from_optimum() {
    let dims = GridDims::new(2, 2).unwrap();
    let mut prepared = PreparedGraph::prepare(dims);
    let result = search(
        &mut prepared,
        &PairwiseGrid::uniform(dims, 2, 1).unwrap(),
        None,
        Hopeless,
        None,
        &SearchPolicyV1 {
            prune_hint: PruneHintPolicyV1::DiscardBeforeEvaluation,
            ..SearchPolicyV1::default()
        },
    )
    .unwrap();
    assert_eq!(
        result.trace.metadata.termination_reason,
        TerminationReasonV1::FrontierExhausted
    );
    assert!(!result.is_optimal());
    assert!(result.best.is_none());
    assert_eq!(result.trace.metadata.total_discarded, 2);
    assert_eq!(result.evaluations, 1);
}

#[test]
fn non_terminating_model_stops_at_budget() {
    let dims = GridDims::new(2, 2).unwrap();
    for strategy in [StrategyV1::BestFirst, StrategyV1::DepthFirst] {
        let mut prepared = PreparedGraph::prepare(dims);
        let result = search(
            &mut prepared,
            &PairwiseGrid::uniform(dims, 2, 1).unwrap(),
            None,
            Hopeless,
            None,
            &SearchPolicyV1 {
                strategy,
                max_evaluations: 40,
                prune_hint: PruneHintPolicyV1::Ignore,
            },
        )
        .unwrap();
        assert_eq!(
            result.trace.metadata.termination_reason,
            TerminationReasonV1::EvaluationBudgetExceeded,
            "{strategy:?}"
        );
        assert!(result.evaluations >= 40);
        assert!(!result.is_optimal());
    }
}

#[test]
fn budget_equal_to_evaluations_used_still_certifies() {
    let dims = GridDims::new(2, 2).unwrap();
    let pairwise = PairwiseGrid::uniform(dims, 3, 2).unwrap();
    let root = TableModel::random(11, dims.pixel_count(), 13, 40);
    for strategy in [StrategyV1::BestFirst, StrategyV1::DepthFirst] {
        let run = |max_evaluations| {
            let mut prepared = PreparedGraph::prepare(dims);
            search(
                &mut prepared,
                &pairwise,
                None,
                root.clone(),
                None,
                &SearchPolicyV1 {
                    max_evaluations,
                    ..policy(strategy)
                },
            )
            .unwrap()
        };
        let unbounded = run(SearchPolicyV1::default().max_evaluations);
        assert!(unbounded.is_optimal(), "{strategy:?}");
        let used = unbounded.evaluations;

        // Every expansion evaluates two children, so the last one starts at
        // `used - 2`; any budget above that lets the search finish.
        for budget in [used, used - 1] {
            let exact = run(budget);
            assert!(exact.is_optimal(), "{strategy:?} budget {budget}");
            assert_eq!(
                exact.trace.metadata.termination_reason,
                unbounded.trace.metadata.termination_reason
            );
            assert_eq!(exact.trace.events, unbounded.trace.events);
            assert_eq!(exact.best_bound(), unbounded.best_bound());
        }

        let short = run(used - 2);
        assert_eq!(
            short.trace.metadata.termination_reason,
            TerminationReasonV1::EvaluationBudgetExceeded,
            "{strategy:?}"
        );
        assert_eq!(short.evaluations, used - 2);
        assert!(!short.is_optimal());
    }
}

#[test]
fn unevaluated_leaf_is_reported() {
    let dims = GridDims::new(1, 1).unwrap();
    let mut prepared = PreparedGraph::prepare(dims);
    let result = search(
        &mut prepared,
        &PairwiseGrid::zero(dims),
        None,
        Opaque,
        None,
        &policy(StrategyV1::BestFirst),
    )
    .unwrap();
    assert_eq!(
        result.trace.metadata.termination_reason,
        TerminationReasonV1::UnevaluatedLeaf { node_id: 0 }
    );
    assert!(!result.is_optimal());
}

#[test]
fn unary_cost_panic_is_caught_with_trace() {
    let dims = GridDims::new(2, 1).unwrap();
    for strategy in [StrategyV1::BestFirst, StrategyV1::DepthFirst] {
        let mut prepared = PreparedGraph::prepare(dims);
        let result = search(
            &mut prepared,
            &PairwiseGrid::zero(dims),
            None,
            Overrun,
            None,
            &policy(strategy),
        )
        .unwrap();
        assert_eq!(
            result.trace.metadata.termination_reason,
            TerminationReasonV1::InternalPanic {
                stage: PanicStageV1::UnaryCosts
            }
        );
        assert!(result.trace.digest().is_ok());
    }
}

#[test]
fn non_leaf_initial_guess_rejected() {
    let dims = GridDims::new(2, 1).unwrap();
    let mut prepared = PreparedGraph::prepare(dims);
    let root = TableModel::random(4, 2, 4, 10);
    let err = search(
        &mut prepared,
        &PairwiseGrid::zero(dims),
        None,
        root.clone(),
        Some(root),
        &policy(StrategyV1::DepthFirst),
    )
    .unwrap_err();
    assert_eq!(err, SearchError::InitialGuessNotLeaf);
}
