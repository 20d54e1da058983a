//! Brute-force oracles for grids small enough to enumerate.
//!
//! Every labeling of every leaf is scored with
//! [`labeling_energy`], with no graph involved, so these results are
//! independent of the max-flow and the evaluator.

use branchcut_kernel::grid::{labeling_energy, Label, PairwiseGrid};
use branchcut_search::{Bound, BranchModel, PreparedGraph, SearchContext};

/// Largest grid [`min_labeling`] will enumerate (2^16 labelings).
pub const MAX_ENUMERABLE_PIXELS: usize = 16;

/// All leaves under `root`, left to right.
#[must_use]
pub fn leaves<M: BranchModel>(root: M) -> Vec<M> {
    let mut stack = vec![root];
    let mut out = Vec::new();
    while let Some(model) = stack.pop() {
        if model.is_leaf() {
            out.push(model);
        } else {
            let (first, second) = model.branch_further();
            stack.push(second);
            stack.push(first);
        }
    }
    out
}

/// Unary costs of `model` with the common bias folded in the way the graph
/// folds it: a positive entry charges foreground, a negative one background.
#[must_use]
pub fn biased_costs<M: BranchModel>(
    model: &M,
    bias: Option<&[i64]>,
    pixels: usize,
) -> (Vec<i64>, Vec<i64>) {
    let mut background = vec![0; pixels];
    let mut foreground = vec![0; pixels];
    model.unary_costs(&mut background, &mut foreground);
    if let Some(bias) = bias {
        for (i, &c) in bias.iter().enumerate() {
            if c > 0 {
                foreground[i] += c;
            } else {
                background[i] -= c;
            }
        }
    }
    (background, foreground)
}

/// Bit `i` of `mask` set means pixel `i` is foreground.
#[must_use]
pub fn labeling_from_mask(mask: u32, pixels: usize) -> Vec<Label> {
    (0..pixels)
        .map(|i| {
            if (mask >> i) & 1 == 1 {
                Label::Foreground
            } else {
                Label::Background
            }
        })
        .collect()
}

/// Minimum-energy labeling by enumeration. Ties go to the smallest mask.
///
/// # Panics
///
/// Panics if the grid has more than [`MAX_ENUMERABLE_PIXELS`] pixels.
#[must_use]
pub fn min_labeling(
    pairwise: &PairwiseGrid,
    background: &[i64],
    foreground: &[i64],
) -> (i64, Vec<Label>) {
    let pixels = pairwise.dims().pixel_count();
    assert!(
        pixels <= MAX_ENUMERABLE_PIXELS,
        "{pixels} pixels is too many to enumerate"
    );
    (0u32..1 << pixels)
        .map(|mask| {
            let labels = labeling_from_mask(mask, pixels);
            (
                labeling_energy(pairwise, &labels, background, foreground),
                labels,
            )
        })
        .min_by_key(|(energy, _)| *energy)
        .expect("at least one labeling exists")
}

/// Minimum energy over every leaf under `root` and every labeling.
/// `None` if every leaf is infeasible.
#[must_use]
pub fn exhaustive_minimum<M: BranchModel>(
    root: M,
    pairwise: &PairwiseGrid,
    bias: Option<&[i64]>,
) -> Option<i64> {
    let pixels = pairwise.dims().pixel_count();
    leaves(root)
        .iter()
        .filter_map(|leaf| {
            let constant = leaf.constant_term().finite()?;
            let (background, foreground) = biased_costs(leaf, bias, pixels);
            Some(min_labeling(pairwise, &background, &foreground).0 + constant)
        })
        .min()
}

/// Bound of `model` evaluated alone, on a fresh graph with no upper bound.
///
/// # Panics
///
/// Panics if the inputs do not fit together or `unary_costs` panics.
#[must_use]
pub fn cold_bound<M: BranchModel>(
    model: M,
    pairwise: &PairwiseGrid,
    bias: Option<&[i64]>,
) -> Bound {
    let mut prepared = PreparedGraph::prepare(pairwise.dims());
    let mut ctx = SearchContext::begin(&mut prepared, pairwise, bias).expect("inputs fit the grid");
    let mut node = ctx.root_node(model);
    ctx.evaluate(&mut node).expect("unary_costs does not panic")
}
