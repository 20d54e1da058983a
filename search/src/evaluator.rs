//! The bound evaluator: one node in, one lower bound out.
//!
//! Terminal weights are applied as deltas against the previous evaluation,
//! and every solve after the first reuses the residual state of the last
//! one. Consecutive tree nodes differ in few pixels, so most evaluations
//! touch a small part of the graph.

use std::panic::{catch_unwind, AssertUnwindSafe};

use branchcut_kernel::graph::{CutGraph, Segment};
use branchcut_kernel::grid::Label;

use crate::bound::Bound;
use crate::context::{BestSolutionV1, PreparedGraph, SearchContext};
use crate::contract::BranchModel;
use crate::node::SearchNodeV1;
use crate::policy::PruneHintPolicyV1;
use crate::trace::{EvaluationOutcomeV1, PanicStageV1, SearchEventV1};

impl<M: BranchModel, G: CutGraph> SearchContext<'_, M, G> {
    /// Compute and store `node`'s lower bound.
    ///
    /// If `node` is a leaf that beats the upper bound, it becomes the new
    /// best record and the upper bound drops to its bound.
    ///
    /// # Errors
    ///
    /// Returns the stage if `unary_costs` panicked. The graph caches are
    /// untouched in that case but the node is left unevaluated.
    pub fn evaluate(&mut self, node: &mut SearchNodeV1<M>) -> Result<Bound, PanicStageV1> {
        self.evaluations += 1;

        // A `NegInfinity` offset carries no energy information; it is read
        // the same way as an explicit skip.
        let constant = if node.model.skip_evaluation() {
            Bound::NegInfinity
        } else {
            node.model.constant_term()
        };
        if constant == Bound::NegInfinity {
            return Ok(self.settle(node, Bound::NegInfinity, EvaluationOutcomeV1::Skipped));
        }

        if constant == Bound::PosInfinity || constant > self.upper_bound {
            let bound = self.upper_bound.offset(Bound::EPSILON);
            return Ok(self.settle(node, bound, EvaluationOutcomeV1::Dominated));
        }

        let PreparedGraph {
            scratch_background,
            scratch_foreground,
            ..
        } = &mut *self.prepared;
        scratch_background.fill(0);
        scratch_foreground.fill(0);
        let model = &node.model;
        catch_unwind(AssertUnwindSafe(|| {
            model.unary_costs(scratch_background, scratch_foreground);
        }))
        .map_err(|_| PanicStageV1::UnaryCosts)?;

        self.apply_terminal_deltas();
        let cut = self.prepared.graph.maxflow(self.solved_once);
        self.solved_once = true;
        self.solves += 1;

        let bound = Bound::Finite(cut).plus(constant);
        Ok(self.settle(node, bound, EvaluationOutcomeV1::Solved))
    }

    /// Drop `node` without evaluating it if the policy honours the model's
    /// prune hint and the hint fires. Returns `true` if dropped.
    pub fn discard_by_hint(&mut self, node: &mut SearchNodeV1<M>) -> bool {
        if self.prune_hint != PruneHintPolicyV1::DiscardBeforeEvaluation
            || !node.model.should_prune()
        {
            return false;
        }
        self.discarded += 1;
        let bound = self.upper_bound.offset(Bound::EPSILON);
        node.set_bound(bound);
        self.events.push(SearchEventV1::Evaluated {
            node_id: node.node_id,
            parent_id: node.parent_id,
            depth: node.depth,
            bound,
            outcome: EvaluationOutcomeV1::DiscardedByHint,
            improved: false,
        });
        true
    }

    /// Push the difference between the scratch costs and the applied costs
    /// into the graph, one terminal edit per changed pixel.
    fn apply_terminal_deltas(&mut self) {
        let PreparedGraph {
            graph,
            applied_background,
            applied_foreground,
            scratch_background,
            scratch_foreground,
            ..
        } = &mut *self.prepared;
        let applied = applied_background.iter_mut().zip(applied_foreground.iter_mut());
        let wanted = scratch_background.iter().zip(scratch_foreground.iter());
        for (i, ((applied_bg, applied_fg), (&bg, &fg))) in applied.zip(wanted).enumerate() {
            let background_delta = bg - *applied_bg;
            let foreground_delta = fg - *applied_fg;
            if background_delta == 0 && foreground_delta == 0 {
                continue;
            }
            // source capacity = foreground cost, sink capacity = background cost
            graph.add_terminal_weights(i, foreground_delta, background_delta);
            if self.solved_once {
                graph.mark_node(i);
            }
            *applied_bg = bg;
            *applied_fg = fg;
            self.terminal_edits += 1;
        }
    }

    /// Store the bound, record the event and, for an improving leaf, replace
    /// the best record.
    fn settle(
        &mut self,
        node: &mut SearchNodeV1<M>,
        bound: Bound,
        outcome: EvaluationOutcomeV1,
    ) -> Bound {
        node.set_bound(bound);
        let improved = outcome == EvaluationOutcomeV1::Solved
            && bound < self.upper_bound
            && node.model.is_leaf();
        if improved {
            self.upper_bound = bound;
            let graph = &self.prepared.graph;
            let labeling = (0..graph.node_count())
                .map(|i| match graph.segment(i) {
                    Segment::Sink => Label::Foreground,
                    Segment::Source => Label::Background,
                })
                .collect();
            self.best = Some(BestSolutionV1 {
                node: node.clone(),
                labeling,
            });
        }
        self.events.push(SearchEventV1::Evaluated {
            node_id: node.node_id,
            parent_id: node.parent_id,
            depth: node.depth,
            bound,
            outcome,
            improved,
        });
        bound
    }
}
