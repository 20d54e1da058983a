//! Grayscale intensity images.
//!
//! No decoding happens here: callers hand over raw 8-bit intensities in
//! row-major order.

use std::sync::Arc;

use branchcut_kernel::grid::{GridDims, GridError};

/// Largest representable intensity.
pub const MAX_INTENSITY: i64 = 255;

/// Error constructing an [`IntensityImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Width or height is zero.
    Grid(GridError),
    /// `pixels.len()` is not `width * height`.
    PixelCountMismatch { expected: usize, actual: usize },
    /// A pixel lies outside `0..=MAX_INTENSITY`.
    IntensityOutOfRange { pixel: usize, value: i64 },
    /// Downsampling factor of zero.
    ZeroFactor,
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "{e}"),
            Self::PixelCountMismatch { expected, actual } => {
                write!(f, "expected {expected} pixels, got {actual}")
            }
            Self::IntensityOutOfRange { pixel, value } => {
                write!(f, "pixel {pixel} has intensity {value} outside 0..={MAX_INTENSITY}")
            }
            Self::ZeroFactor => f.write_str("downsampling factor must be at least 1"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<GridError> for ImageError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

/// An immutable grayscale image. Cloning shares the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityImage {
    dims: GridDims,
    pixels: Arc<[i64]>,
}

impl IntensityImage {
    /// Wrap row-major intensities.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] for empty dimensions, a wrong pixel count, or an
    /// intensity outside `0..=255`.
    pub fn new(width: usize, height: usize, pixels: Vec<i64>) -> Result<Self, ImageError> {
        let dims = GridDims::new(width, height)?;
        if pixels.len() != dims.pixel_count() {
            return Err(ImageError::PixelCountMismatch {
                expected: dims.pixel_count(),
                actual: pixels.len(),
            });
        }
        if let Some(pixel) = pixels.iter().position(|v| !(0..=MAX_INTENSITY).contains(v)) {
            return Err(ImageError::IntensityOutOfRange {
                pixel,
                value: pixels[pixel],
            });
        }
        Ok(Self {
            dims,
            pixels: pixels.into(),
        })
    }

    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[must_use]
    pub fn pixels(&self) -> &[i64] {
        &self.pixels
    }

    /// Mean intensity, rounded down.
    #[must_use]
    pub fn mean(&self) -> i64 {
        let total: i64 = self.pixels.iter().sum();
        total.div_euclid(self.pixels.len() as i64)
    }

    /// Block-average by `factor` in both directions. Edge blocks that run
    /// past the border average only the pixels they cover.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::ZeroFactor`] if `factor == 0`.
    pub fn downsample(&self, factor: usize) -> Result<Self, ImageError> {
        if factor == 0 {
            return Err(ImageError::ZeroFactor);
        }
        let width = self.dims.width.div_ceil(factor);
        let height = self.dims.height.div_ceil(factor);
        let mut pixels = Vec::with_capacity(width * height);
        for by in 0..height {
            for bx in 0..width {
                let ys = by * factor..((by + 1) * factor).min(self.dims.height);
                let xs = bx * factor..((bx + 1) * factor).min(self.dims.width);
                let count = (ys.len() * xs.len()) as i64;
                let total: i64 = ys
                    .flat_map(|y| xs.clone().map(move |x| (x, y)))
                    .map(|(x, y)| self.pixels[self.dims.index(x, y)])
                    .sum();
                pixels.push(total.div_euclid(count));
            }
        }
        Self::new(width, height, pixels)
    }
}
