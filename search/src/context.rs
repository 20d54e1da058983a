//! Graph lifecycle and the per-search context.
//!
//! [`PreparedGraph`] is the persistent part: one max-flow graph plus the
//! terminal-weight caches, allocated once per grid size and reused across
//! searches. [`SearchContext`] borrows it for exactly one top-level search
//! and holds everything that search mutates: upper bound, best record,
//! counters and the event log.

use branchcut_kernel::graph::residual::ResidualGraph;
use branchcut_kernel::graph::CutGraph;
use branchcut_kernel::grid::{GridDims, GridError, Label, PairwiseGrid};

use crate::bound::Bound;
use crate::contract::BranchModel;
use crate::error::SearchError;
use crate::node::SearchNodeV1;
use crate::policy::PruneHintPolicyV1;
use crate::trace::SearchEventV1;

/// A max-flow graph sized for one grid, with the terminal-weight caches the
/// evaluator diffs against.
pub struct PreparedGraph<G = ResidualGraph> {
    dims: GridDims,
    pub(crate) graph: G,
    pub(crate) applied_background: Vec<i64>,
    pub(crate) applied_foreground: Vec<i64>,
    pub(crate) scratch_background: Vec<i64>,
    pub(crate) scratch_foreground: Vec<i64>,
}

impl PreparedGraph<ResidualGraph> {
    /// Allocate graph and caches for `dims` using the bundled max-flow.
    #[must_use]
    pub fn prepare(dims: GridDims) -> Self {
        Self::with_graph(dims, ResidualGraph::default())
    }
}

impl<G: CutGraph> PreparedGraph<G> {
    /// Allocate caches for `dims` around a caller-supplied graph.
    #[must_use]
    pub fn with_graph(dims: GridDims, mut graph: G) -> Self {
        let n = dims.pixel_count();
        graph.reset(n, 0);
        Self {
            dims,
            graph,
            applied_background: vec![0; n],
            applied_foreground: vec![0; n],
            scratch_background: vec![0; n],
            scratch_foreground: vec![0; n],
        }
    }

    /// Dimensions this graph was prepared for.
    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// The underlying graph (for solver statistics).
    #[must_use]
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Release the caches and hand the graph back.
    #[must_use]
    pub fn release(self) -> G {
        self.graph
    }

    /// Rebuild the topology from scratch: pairwise edges, then the common
    /// unary bias. Clears the terminal caches.
    fn load(&mut self, pairwise: &PairwiseGrid, unary_bias: Option<&[i64]>) {
        let n = self.dims.pixel_count();
        let edges = pairwise.edges();
        self.graph.reset(n, edges.len());
        for e in &edges {
            self.graph.add_edge(e.from, e.to, e.weight, e.weight);
        }
        if let Some(bias) = unary_bias {
            for (i, &c) in bias.iter().enumerate() {
                if c > 0 {
                    self.graph.add_terminal_weights(i, c, 0);
                } else if c < 0 {
                    self.graph.add_terminal_weights(i, 0, -c);
                }
            }
        }
        self.applied_background.fill(0);
        self.applied_foreground.fill(0);
    }
}

/// The best leaf found so far and the labeling its cut induced.
#[derive(Debug, Clone)]
pub struct BestSolutionV1<M> {
    /// Clone of the winning node, bound set.
    pub node: SearchNodeV1<M>,
    /// Per-pixel labels read off the cut that scored `node`.
    pub labeling: Vec<Label>,
}

/// Mutable state of one top-level search.
pub struct SearchContext<'g, M, G = ResidualGraph> {
    pub(crate) prepared: &'g mut PreparedGraph<G>,
    pub(crate) solved_once: bool,
    pub(crate) upper_bound: Bound,
    pub(crate) best: Option<BestSolutionV1<M>>,
    pub(crate) prune_hint: PruneHintPolicyV1,
    pub(crate) next_node_id: u64,
    /// Unbounded; grows with every evaluation up to the policy budget.
    pub(crate) events: Vec<SearchEventV1>,
    pub(crate) evaluations: u64,
    pub(crate) solves: u64,
    pub(crate) terminal_edits: u64,
    pub(crate) expansions: u64,
    pub(crate) pruned: u64,
    pub(crate) discarded: u64,
}

impl<'g, M: BranchModel, G: CutGraph> SearchContext<'g, M, G> {
    /// Validate inputs against the prepared graph and load the topology.
    ///
    /// # Errors
    ///
    /// - [`SearchError::DimensionMismatch`] if `pairwise` was built for other dims.
    /// - [`SearchError::Grid`] if `unary_bias` does not hold one value per pixel.
    pub fn begin(
        prepared: &'g mut PreparedGraph<G>,
        pairwise: &PairwiseGrid,
        unary_bias: Option<&[i64]>,
    ) -> Result<Self, SearchError> {
        if pairwise.dims() != prepared.dims() {
            return Err(SearchError::DimensionMismatch {
                prepared: prepared.dims(),
                requested: pairwise.dims(),
            });
        }
        let expected = prepared.dims().pixel_count();
        if let Some(bias) = unary_bias {
            if bias.len() != expected {
                return Err(GridError::BiasCountMismatch {
                    expected,
                    actual: bias.len(),
                }
                .into());
            }
        }
        prepared.load(pairwise, unary_bias);
        Ok(Self {
            prepared,
            solved_once: false,
            upper_bound: Bound::PosInfinity,
            best: None,
            prune_hint: PruneHintPolicyV1::Ignore,
            next_node_id: 0,
            events: Vec::new(),
            evaluations: 0,
            solves: 0,
            terminal_edits: 0,
            expansions: 0,
            pruned: 0,
            discarded: 0,
        })
    }

    /// Select how the model's prune hint is treated.
    #[must_use]
    pub fn with_prune_hint(mut self, prune_hint: PruneHintPolicyV1) -> Self {
        self.prune_hint = prune_hint;
        self
    }

    /// Wrap a model as a fresh depth-0 node.
    pub fn root_node(&mut self, model: M) -> SearchNodeV1<M> {
        let id = self.allocate_id();
        SearchNodeV1::new(id, None, 0, model)
    }

    pub(crate) fn child_nodes(
        &mut self,
        parent: &SearchNodeV1<M>,
        (first, second): (M, M),
    ) -> [SearchNodeV1<M>; 2] {
        let depth = parent.depth + 1;
        let a = SearchNodeV1::new(self.allocate_id(), Some(parent.node_id), depth, first);
        let b = SearchNodeV1::new(self.allocate_id(), Some(parent.node_id), depth, second);
        self.expansions += 1;
        self.events.push(SearchEventV1::Expanded {
            node_id: parent.node_id,
            bound: parent.bound().unwrap_or(Bound::NegInfinity),
            children: [a.node_id, b.node_id],
        });
        [a, b]
    }

    pub(crate) fn record_pruned(&mut self, node: &SearchNodeV1<M>) {
        self.pruned += 1;
        self.events.push(SearchEventV1::Pruned {
            node_id: node.node_id,
            bound: node.bound().unwrap_or(Bound::NegInfinity),
            upper_bound: self.upper_bound,
        });
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Energy of the best leaf found so far (`PosInfinity` if none).
    #[must_use]
    pub fn upper_bound(&self) -> Bound {
        self.upper_bound
    }

    /// Lower the upper bound without a best record, as if a leaf of energy
    /// `bound` were known. Never raises it.
    pub fn tighten_upper_bound(&mut self, bound: Bound) {
        if bound < self.upper_bound {
            self.upper_bound = bound;
        }
    }

    /// The current best record.
    #[must_use]
    pub fn best(&self) -> Option<&BestSolutionV1<M>> {
        self.best.as_ref()
    }

    /// Bound evaluations performed so far.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Cut solves performed so far.
    #[must_use]
    pub fn solves(&self) -> u64 {
        self.solves
    }

    /// Terminal-edge edits applied to the graph so far.
    #[must_use]
    pub fn terminal_edits(&self) -> u64 {
        self.terminal_edits
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[SearchEventV1] {
        &self.events
    }

    /// The borrowed graph.
    #[must_use]
    pub fn graph(&self) -> &G {
        &self.prepared.graph
    }
}
