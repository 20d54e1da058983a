//! Grid geometry, the four-neighbour pairwise grid, and labeling energy.
//!
//! Pixels are indexed row-major: `i = y * width + x`. Every pixel carries four
//! forward neighbour weights in the fixed order [`Neighbor::ALL`]; together
//! they cover each 8-connected pair exactly once. Weights whose target lies
//! outside the grid are stored but ignored.

/// Typed failure for grid construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is zero.
    EmptyGrid { width: usize, height: usize },
    /// The pairwise array does not hold four weights per pixel.
    WeightCountMismatch { expected: usize, actual: usize },
    /// A pairwise weight is negative (no min-cut representation).
    NegativeWeight {
        pixel: usize,
        neighbor: Neighbor,
        weight: i64,
    },
    /// The common unary bias array does not hold one value per pixel.
    BiasCountMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGrid { width, height } => {
                write!(f, "grid must be non-empty, got {width}x{height}")
            }
            Self::WeightCountMismatch { expected, actual } => {
                write!(f, "expected {expected} pairwise weights, got {actual}")
            }
            Self::NegativeWeight {
                pixel,
                neighbor,
                weight,
            } => write!(
                f,
                "negative pairwise weight {weight} at pixel {pixel} ({neighbor:?})"
            ),
            Self::BiasCountMismatch { expected, actual } => {
                write!(f, "expected {expected} unary bias values, got {actual}")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Width and height of a pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub width: usize,
    pub height: usize,
}

impl GridDims {
    /// Construct non-empty dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyGrid`] if either side is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Row-major index of `(x, y)`.
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// A forward neighbour direction.
///
/// The discriminant is the weight slot within a pixel's group of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    UpRight = 0,
    Right = 1,
    DownRight = 2,
    Down = 3,
}

impl Neighbor {
    /// All directions in weight-slot order.
    pub const ALL: [Neighbor; 4] = [
        Neighbor::UpRight,
        Neighbor::Right,
        Neighbor::DownRight,
        Neighbor::Down,
    ];

    /// Whether this direction connects two pixels at distance √2.
    #[must_use]
    pub fn is_diagonal(self) -> bool {
        matches!(self, Neighbor::UpRight | Neighbor::DownRight)
    }

    /// Index of the neighbour of `(x, y)` in this direction, if inside the grid.
    #[must_use]
    pub fn target(self, dims: GridDims, x: usize, y: usize) -> Option<usize> {
        let has_right = x + 1 < dims.width;
        let has_below = y + 1 < dims.height;
        match self {
            Neighbor::UpRight if has_right && y > 0 => Some(dims.index(x + 1, y - 1)),
            Neighbor::Right if has_right => Some(dims.index(x + 1, y)),
            Neighbor::DownRight if has_right && has_below => Some(dims.index(x + 1, y + 1)),
            Neighbor::Down if has_below => Some(dims.index(x, y + 1)),
            _ => None,
        }
    }
}

/// An undirected grid edge with a symmetric capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridEdge {
    pub from: usize,
    pub to: usize,
    pub weight: i64,
}

/// Pairwise (smoothness) costs: four non-negative weights per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseGrid {
    dims: GridDims,
    weights: Vec<i64>,
}

impl PairwiseGrid {
    /// Build from a flat `[pixel][Neighbor::ALL]` weight array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::WeightCountMismatch`] if `weights.len() != 4 * pixels`
    /// and [`GridError::NegativeWeight`] for the first negative weight found.
    pub fn new(dims: GridDims, weights: Vec<i64>) -> Result<Self, GridError> {
        let expected = dims.pixel_count() * 4;
        if weights.len() != expected {
            return Err(GridError::WeightCountMismatch {
                expected,
                actual: weights.len(),
            });
        }
        if let Some(pos) = weights.iter().position(|&w| w < 0) {
            return Err(GridError::NegativeWeight {
                pixel: pos / 4,
                neighbor: Neighbor::ALL[pos % 4],
                weight: weights[pos],
            });
        }
        Ok(Self { dims, weights })
    }

    /// Every pixel gets `orthogonal` on right/down edges and `diagonal` on the
    /// two diagonal edges.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NegativeWeight`] if either weight is negative.
    pub fn uniform(dims: GridDims, orthogonal: i64, diagonal: i64) -> Result<Self, GridError> {
        let weights = (0..dims.pixel_count())
            .flat_map(|_| {
                Neighbor::ALL.map(|n| if n.is_diagonal() { diagonal } else { orthogonal })
            })
            .collect();
        Self::new(dims, weights)
    }

    /// A grid with no pairwise interaction.
    #[must_use]
    pub fn zero(dims: GridDims) -> Self {
        Self {
            dims,
            weights: vec![0; dims.pixel_count() * 4],
        }
    }

    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Weight stored for `pixel` towards `neighbor` (even if it leaves the grid).
    #[must_use]
    pub fn weight(&self, pixel: usize, neighbor: Neighbor) -> i64 {
        self.weights[pixel * 4 + neighbor as usize]
    }

    /// All in-grid edges with a positive weight, in pixel order.
    #[must_use]
    pub fn edges(&self) -> Vec<GridEdge> {
        let dims = self.dims;
        let mut edges = Vec::with_capacity(self.weights.len());
        for y in 0..dims.height {
            for x in 0..dims.width {
                let from = dims.index(x, y);
                for n in Neighbor::ALL {
                    let weight = self.weight(from, n);
                    if weight == 0 {
                        continue;
                    }
                    if let Some(to) = n.target(dims, x, y) {
                        edges.push(GridEdge { from, to, weight });
                    }
                }
            }
        }
        edges
    }
}

/// Binary pixel label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Background = 0,
    Foreground = 1,
}

impl Label {
    /// `0` for background, `1` for foreground.
    #[must_use]
    pub fn as_bit(self) -> u8 {
        self as u8
    }
}

/// Pack labels 8 per byte, least-significant bit first.
#[must_use]
pub fn pack_labels(labels: &[Label]) -> Vec<u8> {
    let mut bytes = vec![0u8; labels.len().div_ceil(8)];
    for (i, label) in labels.iter().enumerate() {
        bytes[i / 8] |= label.as_bit() << (i % 8);
    }
    bytes
}

/// Inverse of [`pack_labels`]. Returns `None` if `bytes` is too short.
#[must_use]
pub fn unpack_labels(bytes: &[u8], len: usize) -> Option<Vec<Label>> {
    if bytes.len() < len.div_ceil(8) {
        return None;
    }
    Some(
        (0..len)
            .map(|i| {
                if (bytes[i / 8] >> (i % 8)) & 1 == 1 {
                    Label::Foreground
                } else {
                    Label::Background
                }
            })
            .collect(),
    )
}

/// Energy of a labeling: the unary cost of the chosen label at every pixel
/// plus the weight of every edge whose endpoints disagree.
///
/// `background` and `foreground` must hold one value per pixel; `labels` must
/// match the grid.
#[must_use]
pub fn labeling_energy(
    pairwise: &PairwiseGrid,
    labels: &[Label],
    background: &[i64],
    foreground: &[i64],
) -> i64 {
    let unary: i64 = labels
        .iter()
        .enumerate()
        .map(|(i, label)| match label {
            Label::Background => background[i],
            Label::Foreground => foreground[i],
        })
        .sum();
    let boundary: i64 = pairwise
        .edges()
        .iter()
        .filter(|e| labels[e.from] != labels[e.to])
        .map(|e| e.weight)
        .sum();
    unary + boundary
}
