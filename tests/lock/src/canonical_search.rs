//! Single source of truth for the canonical segmentation.
//!
//! Used by both the `search_fixture` binary and the in-process determinism
//! tests, so the cross-process harness and the in-process checks can never
//! drift apart.
//!
//! Image: 5x4, a bright 3x2 block on a dark field, with a little noise.

use branchcut_harness::config::SegmentationConfig;
use branchcut_harness::image::IntensityImage;
use branchcut_harness::runner::{segment, SegmentationRun};
use branchcut_search::StrategyV1;

pub const CANONICAL_WIDTH: usize = 5;
pub const CANONICAL_HEIGHT: usize = 4;

#[rustfmt::skip]
const CANONICAL_PIXELS: [i64; CANONICAL_WIDTH * CANONICAL_HEIGHT] = [
    31,  28,  35,  30,  27,
    29, 201, 196, 210,  33,
    34, 190, 205, 199,  26,
    30,  32,  25,  36,  31,
];

/// The canonical image.
///
/// # Panics
///
/// Panics if the constant pixel table stops matching its dimensions.
#[must_use]
pub fn canonical_image() -> IntensityImage {
    IntensityImage::new(CANONICAL_WIDTH, CANONICAL_HEIGHT, CANONICAL_PIXELS.to_vec())
        .expect("canonical pixel table matches its dimensions")
}

/// Configuration used for the canonical run under `strategy`.
#[must_use]
pub fn canonical_config(strategy: StrategyV1) -> SegmentationConfig {
    SegmentationConfig {
        lambda: 40,
        mu: 2,
        strategy,
        ..SegmentationConfig::default()
    }
}

/// Run the canonical segmentation.
///
/// # Panics
///
/// Panics if the run fails. The inputs are fixed, so that is a search bug,
/// not a usage error.
#[must_use]
pub fn canonical_run(strategy: StrategyV1) -> SegmentationRun {
    segment(&canonical_image(), &canonical_config(strategy)).expect("canonical run succeeds")
}
