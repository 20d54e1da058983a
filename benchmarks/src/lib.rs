//! Shared helpers for branchcut benchmark suites.

use branchcut_harness::config::SegmentationConfig;
use branchcut_harness::image::{IntensityImage, MAX_INTENSITY};
use branchcut_harness::models::chan_vese::{chan_vese_bias, chan_vese_pairwise, ChanVeseModel};
use branchcut_kernel::grid::PairwiseGrid;
use branchcut_search::{BranchModel, PreparedGraph, SearchContext, SearchNodeV1, StrategyV1};

/// A named benchmark input.
pub struct Regime {
    pub name: &'static str,
    pub image: IntensityImage,
    pub config: SegmentationConfig,
}

/// Deterministic noise in `-amplitude..=amplitude`.
struct Noise(u64);

impl Noise {
    fn next(&mut self, amplitude: i64) -> i64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let span = u64::try_from(2 * amplitude + 1).unwrap_or(1);
        i64::try_from((self.0 >> 33) % span).unwrap_or(0) - amplitude
    }
}

/// A bright disk on a dark field with uniform noise, `side` pixels square.
///
/// # Panics
///
/// Panics if `side` is zero. Benchmark setup failures are fatal.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn disk_image(side: usize, dark: i64, bright: i64, noise: i64, seed: u64) -> IntensityImage {
    let mut rng = Noise(seed);
    let center = side as f64 / 2.0;
    let radius = side as f64 / 3.0;
    let pixels = (0..side * side)
        .map(|i| {
            let (x, y) = ((i % side) as f64 + 0.5, (i / side) as f64 + 0.5);
            let inside = (x - center).hypot(y - center) <= radius;
            let base = if inside { bright } else { dark };
            (base + rng.next(noise)).clamp(0, MAX_INTENSITY)
        })
        .collect();
    IntensityImage::new(side, side, pixels).expect("disk image is well-formed")
}

/// The regimes the macro benchmarks sweep: clean and noisy images, and a
/// boundary penalty strong enough to make the cut non-trivial.
#[must_use]
pub fn regimes(strategy: StrategyV1) -> Vec<Regime> {
    let config = |lambda| SegmentationConfig {
        lambda,
        strategy,
        ..SegmentationConfig::default()
    };
    vec![
        Regime {
            name: "clean_16",
            image: disk_image(16, 40, 190, 0, 1),
            config: config(200),
        },
        Regime {
            name: "noisy_16",
            image: disk_image(16, 40, 190, 30, 2),
            config: config(2_000),
        },
        Regime {
            name: "noisy_32",
            image: disk_image(32, 60, 170, 25, 3),
            config: config(2_000),
        },
        Regime {
            name: "low_contrast_24",
            image: disk_image(24, 100, 140, 20, 4),
            config: config(800),
        },
    ]
}

/// Grid inputs for driving the evaluator directly.
pub struct EvaluatorSetup {
    pub pairwise: PairwiseGrid,
    pub bias: Vec<i64>,
    pub root: ChanVeseModel,
}

/// Pairwise grid, bias and full-range root for `image` under `config`.
///
/// # Panics
///
/// Panics if `config.lambda` is negative.
#[must_use]
pub fn evaluator_setup(image: &IntensityImage, config: &SegmentationConfig) -> EvaluatorSetup {
    let dims = image.dims();
    EvaluatorSetup {
        pairwise: chan_vese_pairwise(dims, config.lambda).expect("lambda is non-negative"),
        bias: chan_vese_bias(dims, config.mu),
        root: ChanVeseModel::full_range(image.clone(), config.mu),
    }
}

/// The models met on the leftmost root-to-leaf path under `root`.
#[must_use]
pub fn descent<M: BranchModel>(root: M) -> Vec<M> {
    let mut path = vec![root];
    while let Some(last) = path.last() {
        if last.is_leaf() {
            break;
        }
        let (first, _) = last.branch_further();
        path.push(first);
    }
    path
}

/// `count` evaluated nodes with spread-out bounds, for frontier benchmarks.
///
/// # Panics
///
/// Panics if a bound evaluation panics.
#[must_use]
pub fn evaluated_nodes(count: usize) -> Vec<SearchNodeV1<ChanVeseModel>> {
    let image = disk_image(4, 50, 180, 10, 9);
    let setup = evaluator_setup(&image, &SegmentationConfig::default());
    let mut prepared = PreparedGraph::prepare(image.dims());
    let mut ctx = SearchContext::begin(&mut prepared, &setup.pairwise, Some(&setup.bias))
        .expect("setup fits the grid");
    let models = descent(setup.root);
    (0..count)
        .map(|i| {
            let mut node = ctx.root_node(models[i % models.len()].clone());
            ctx.evaluate(&mut node).expect("evaluation does not panic");
            node
        })
        .collect()
}
