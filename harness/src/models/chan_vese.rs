//! Two-intensity (Chan–Vese) segmentation as a branch model.
//!
//! A labeling is scored by how far each pixel is from the intensity of its
//! region, `c_b` for background and `c_f` for foreground, plus a boundary
//! length penalty and a per-pixel foreground bias `mu`:
//!
//! ```text
//! E(x, c_b, c_f) = Σ_bg (I − c_b)² + Σ_fg (I − c_f)² + λ·|∂x| + μ·|fg|
//! ```
//!
//! The search ranges over integer `(c_b, c_f)`. A node holds an interval for
//! each; its unary cost at a pixel is the squared distance from the pixel's
//! intensity to the interval, which is never larger than the cost under any
//! single `(c_b, c_f)` inside it.

use branchcut_kernel::grid::{GridDims, GridError, PairwiseGrid};
use branchcut_search::{Bound, BranchModel};

use crate::image::{IntensityImage, MAX_INTENSITY};

/// A closed integer interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityRange {
    pub min: i64,
    pub max: i64,
}

impl IntensityRange {
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// `[center - radius, center + radius]` clipped to the intensity scale.
    /// The centre is clamped onto the scale and a negative radius counts as 0.
    #[must_use]
    pub fn around(center: i64, radius: i64) -> Self {
        let center = center.clamp(0, MAX_INTENSITY);
        let radius = radius.max(0);
        Self {
            min: (center - radius).max(0),
            max: (center + radius).min(MAX_INTENSITY),
        }
    }

    #[must_use]
    pub fn is_point(self) -> bool {
        self.min == self.max
    }

    /// `0 ≤ min ≤ max ≤ MAX_INTENSITY`. Bisection reaches a point only from
    /// such a range.
    #[must_use]
    pub fn is_within_scale(self) -> bool {
        0 <= self.min && self.min <= self.max && self.max <= MAX_INTENSITY
    }

    fn width(self) -> i64 {
        self.max - self.min
    }

    /// Lower half `[min, mid]` and upper half `[mid + 1, max]`.
    fn halves(self) -> (Self, Self) {
        let mid = (self.min + self.max).div_euclid(2);
        (Self::new(self.min, mid), Self::new(mid + 1, self.max))
    }

    /// Squared distance from `value` to the interval (0 inside).
    fn distance_squared(self, value: i64) -> i64 {
        let d = if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0
        };
        d * d
    }
}

/// A box of `(c_b, c_f)` candidates over one image.
#[derive(Debug, Clone)]
pub struct ChanVeseModel {
    pub background: IntensityRange,
    pub foreground: IntensityRange,
    mu: i64,
    mean: i64,
    image: IntensityImage,
}

impl ChanVeseModel {
    /// A model over explicit intervals.
    #[must_use]
    pub fn new(
        image: IntensityImage,
        background: IntensityRange,
        foreground: IntensityRange,
        mu: i64,
    ) -> Self {
        Self {
            background,
            foreground,
            mu,
            mean: image.mean(),
            image,
        }
    }

    /// The whole intensity scale, split at the image mean: `c_b ≤ mean < c_f`.
    #[must_use]
    pub fn full_range(image: IntensityImage, mu: i64) -> Self {
        let split = image.mean().min(MAX_INTENSITY - 1);
        Self::new(
            image,
            IntensityRange::new(0, split),
            IntensityRange::new(split + 1, MAX_INTENSITY),
            mu,
        )
    }

    /// Windows of `radius` around a previous estimate.
    #[must_use]
    pub fn refined(image: IntensityImage, c_b: i64, c_f: i64, radius: i64, mu: i64) -> Self {
        Self::new(
            image,
            IntensityRange::around(c_b, radius),
            IntensityRange::around(c_f, radius),
            mu,
        )
    }

    /// Both windows are non-empty and on the intensity scale.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.background.is_within_scale() && self.foreground.is_within_scale()
    }

    #[must_use]
    pub fn image(&self) -> &IntensityImage {
        &self.image
    }

    /// Full-image unary costs of this node, bias excluded.
    #[must_use]
    pub fn unary_vectors(&self) -> (Vec<i64>, Vec<i64>) {
        let n = self.image.pixels().len();
        let mut background = vec![0; n];
        let mut foreground = vec![0; n];
        self.unary_costs(&mut background, &mut foreground);
        (background, foreground)
    }
}

impl BranchModel for ChanVeseModel {
    fn is_leaf(&self) -> bool {
        self.background.is_point() && self.foreground.is_point()
    }

    /// Halve the wider interval; on equal widths halve `c_b`.
    fn branch_further(&self) -> (Self, Self) {
        let mut low = self.clone();
        let mut high = self.clone();
        if self.foreground.width() > self.background.width() {
            (low.foreground, high.foreground) = self.foreground.halves();
        } else {
            (low.background, high.background) = self.background.halves();
        }
        (low, high)
    }

    fn unary_costs(&self, background: &mut [i64], foreground: &mut [i64]) {
        for ((&value, bg), fg) in self
            .image
            .pixels()
            .iter()
            .zip(background.iter_mut())
            .zip(foreground.iter_mut())
        {
            *bg = self.background.distance_squared(value);
            *fg = self.foreground.distance_squared(value);
        }
    }

    /// Without a bias the two labels are interchangeable; only `c_b ≤ c_f`
    /// is kept.
    fn constant_term(&self) -> Bound {
        if self.mu == 0 && self.background.min > self.foreground.max {
            Bound::PosInfinity
        } else {
            Bound::ZERO
        }
    }

    /// Both intervals lie strictly on one side of the image mean.
    fn should_prune(&self) -> bool {
        let below = self.background.max < self.mean && self.foreground.max < self.mean;
        let above = self.background.min > self.mean && self.foreground.min > self.mean;
        below || above
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "c_b": [self.background.min, self.background.max],
            "c_f": [self.foreground.min, self.foreground.max],
        })
    }
}

/// Boundary penalty for Chan–Vese: `lambda` between orthogonal neighbours,
/// `lambda / √2` (rounded) between diagonal ones.
///
/// # Errors
///
/// Returns [`GridError::NegativeWeight`] if `lambda < 0`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn chan_vese_pairwise(dims: GridDims, lambda: i64) -> Result<PairwiseGrid, GridError> {
    let diagonal = (lambda as f64 / std::f64::consts::SQRT_2).round() as i64;
    PairwiseGrid::uniform(dims, lambda, diagonal)
}

/// Position-independent foreground bias: `mu` at every pixel.
#[must_use]
pub fn chan_vese_bias(dims: GridDims, mu: i64) -> Vec<i64> {
    vec![mu; dims.pixel_count()]
}
