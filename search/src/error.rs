//! Typed search errors.
//!
//! `SearchError` represents pre-flight failures only. Runtime terminations
//! (defective node models, caught panics, budget exhaustion) are expressed
//! via [`crate::trace::TerminationReasonV1`] and always produce a
//! `SearchTraceV1`.

use branchcut_kernel::grid::{GridDims, GridError};

/// Typed failure for pre-flight search validation.
///
/// No `SearchTraceV1` is produced because no search steps were taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The pairwise grid does not match the dimensions the graph was prepared for.
    DimensionMismatch {
        prepared: GridDims,
        requested: GridDims,
    },
    /// Grid inputs are malformed (e.g. wrong bias length).
    Grid(GridError),
    /// A depth-first initial guess must be a leaf: only a leaf's bound is an
    /// achievable energy.
    InitialGuessNotLeaf,
    /// The search policy is unusable.
    InvalidPolicy { detail: String },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DimensionMismatch {
                prepared,
                requested,
            } => write!(
                f,
                "graph prepared for {}x{} but search requested {}x{}",
                prepared.width, prepared.height, requested.width, requested.height
            ),
            Self::Grid(e) => write!(f, "invalid grid input: {e}"),
            Self::InitialGuessNotLeaf => f.write_str("initial guess is not a leaf"),
            Self::InvalidPolicy { detail } => write!(f, "invalid search policy: {detail}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for SearchError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}
