//! Segmentation runner: image + configuration in, report + trace out.
//!
//! # Pipeline
//!
//! ```text
//! build_config_snapshot() → chan_vese_pairwise() + chan_vese_bias()
//!   → PreparedGraph::prepare() → search() → trace digest → report
//! ```
//!
//! Coarse-to-fine runs the pipeline twice: once on a block-averaged copy of
//! the image over the full intensity scale, then on the original image with
//! narrow windows around the coarse estimate.

use branchcut_kernel::grid::{pack_labels, unpack_labels, GridError, Label};
use branchcut_kernel::proof::canon::{canonical_json_bytes, CanonError};
use branchcut_kernel::proof::hash::ContentHash;
use branchcut_search::{
    search, Bound, PreparedGraph, SearchError, SearchResult, SearchTraceV1, StrategyV1,
    TerminationReasonV1,
};

use crate::config::{build_config_snapshot, ConfigError, SegmentationConfig};
use crate::image::{ImageError, IntensityImage};
use crate::models::chan_vese::{chan_vese_bias, chan_vese_pairwise, ChanVeseModel, IntensityRange};

/// Error during a segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Config(ConfigError),
    Image(ImageError),
    Grid(GridError),
    /// Pre-flight search failure.
    Search(SearchError),
    /// Trace or report serialization failed.
    Canon(CanonError),
    /// The search stopped without a finite best leaf.
    NoSolution { termination: TerminationReasonV1 },
    /// A root or initial guess window is empty or leaves `0..=255`.
    InvalidWindow { c_b: [i64; 2], c_f: [i64; 2] },
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Image(e) => write!(f, "image: {e}"),
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::Search(e) => write!(f, "search: {e}"),
            Self::Canon(e) => write!(f, "serialization: {e}"),
            Self::NoSolution { termination } => {
                write!(f, "search found no solution ({termination:?})")
            }
            Self::InvalidWindow { c_b, c_f } => write!(
                f,
                "intensity windows c_b={c_b:?} c_f={c_f:?} must be non-empty and within 0..=255"
            ),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ImageError> for RunError {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<GridError> for RunError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<SearchError> for RunError {
    fn from(e: SearchError) -> Self {
        Self::Search(e)
    }
}

impl From<CanonError> for RunError {
    fn from(e: CanonError) -> Self {
        Self::Canon(e)
    }
}

/// Summary of one segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationReportV1 {
    pub width: usize,
    pub height: usize,
    /// Background intensity of the winning leaf.
    pub c_b: i64,
    /// Foreground intensity of the winning leaf.
    pub c_f: i64,
    /// Energy of `labeling` under `(c_b, c_f)`, bias included.
    pub energy: i64,
    pub labeling: Vec<Label>,
    pub evaluations: u64,
    /// The search certified `energy` as the minimum over its root.
    pub optimal: bool,
    pub trace_digest: ContentHash,
    pub config_digest: ContentHash,
}

/// Error reconstructing a report from JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportParseError {
    /// Not valid JSON.
    Json { detail: String },
    /// `schema_version` is not `segmentation_report.v1`.
    VersionMismatch { found: String },
    /// A field is missing or has the wrong type.
    Field { name: &'static str },
}

impl std::fmt::Display for ReportParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json { detail } => write!(f, "report is not JSON: {detail}"),
            Self::VersionMismatch { found } => write!(f, "report version mismatch: {found}"),
            Self::Field { name } => write!(f, "report field missing or invalid: {name}"),
        }
    }
}

impl std::error::Error for ReportParseError {}

const REPORT_SCHEMA_VERSION: &str = "segmentation_report.v1";

impl SegmentationReportV1 {
    /// The report as JSON; the labeling is packed and hex-encoded.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "c_b": self.c_b,
            "c_f": self.c_f,
            "config_digest": self.config_digest.as_str(),
            "energy": self.energy,
            "evaluations": self.evaluations,
            "height": self.height,
            "labeling_hex": hex::encode(pack_labels(&self.labeling)),
            "optimal": self.optimal,
            "schema_version": REPORT_SCHEMA_VERSION,
            "trace_digest": self.trace_digest.as_str(),
            "width": self.width,
        })
    }

    /// Canonical JSON bytes of [`to_json_value`](Self::to_json_value).
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] (not expected: every field is an integer or string).
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Inverse of [`to_json_value`](Self::to_json_value).
    ///
    /// # Errors
    ///
    /// Returns [`ReportParseError`] for malformed JSON, a wrong schema
    /// version, or any missing or ill-typed field.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ReportParseError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ReportParseError::Json {
                detail: format!("{e}"),
            })?;
        let version = value["schema_version"].as_str().unwrap_or("");
        if version != REPORT_SCHEMA_VERSION {
            return Err(ReportParseError::VersionMismatch {
                found: version.to_string(),
            });
        }

        let int = |name: &'static str| value[name].as_i64().ok_or(ReportParseError::Field { name });
        let size = |name: &'static str| {
            value[name]
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(ReportParseError::Field { name })
        };
        let hash = |name: &'static str| {
            value[name]
                .as_str()
                .and_then(ContentHash::parse)
                .ok_or(ReportParseError::Field { name })
        };

        let width = size("width")?;
        let height = size("height")?;
        let labeling = value["labeling_hex"]
            .as_str()
            .and_then(|s| hex::decode(s).ok())
            .and_then(|bytes| unpack_labels(&bytes, width * height))
            .ok_or(ReportParseError::Field {
                name: "labeling_hex",
            })?;

        Ok(Self {
            width,
            height,
            c_b: int("c_b")?,
            c_f: int("c_f")?,
            energy: int("energy")?,
            labeling,
            evaluations: value["evaluations"]
                .as_u64()
                .ok_or(ReportParseError::Field {
                    name: "evaluations",
                })?,
            optimal: value["optimal"]
                .as_bool()
                .ok_or(ReportParseError::Field { name: "optimal" })?,
            trace_digest: hash("trace_digest")?,
            config_digest: hash("config_digest")?,
        })
    }
}

/// One finished search: its report and full trace.
#[derive(Debug, Clone)]
pub struct SegmentationRun {
    pub report: SegmentationReportV1,
    pub trace: SearchTraceV1,
}

/// Both passes of a coarse-to-fine segmentation.
#[derive(Debug, Clone)]
pub struct CoarseToFineRun {
    pub coarse: SegmentationRun,
    pub fine: SegmentationRun,
}

/// Segment `image` over the whole intensity scale, split at its mean.
///
/// # Errors
///
/// Returns [`RunError`] on invalid configuration, pre-flight search failure,
/// or a search that ends without a solution.
pub fn segment(image: &IntensityImage, config: &SegmentationConfig) -> Result<SegmentationRun, RunError> {
    let root = ChanVeseModel::full_range(image.clone(), config.mu);
    segment_with_root(image, config, config.lambda, root, None)
}

/// Estimate `(c_b, c_f)` on a block-averaged copy of `image` (with half the
/// boundary penalty), then segment `image` within `refine_radius` of the
/// estimate. Depth-first fine passes start from the estimate as initial guess.
///
/// # Errors
///
/// Same as [`segment`], for either pass.
pub fn segment_coarse_to_fine(
    image: &IntensityImage,
    config: &SegmentationConfig,
) -> Result<CoarseToFineRun, RunError> {
    config.validate()?;
    let coarse_image = image.downsample(config.coarse_factor)?;
    let coarse_root = ChanVeseModel::full_range(coarse_image.clone(), config.mu);
    let coarse = segment_with_root(&coarse_image, config, config.lambda / 2, coarse_root, None)?;

    let (c_b, c_f) = (coarse.report.c_b, coarse.report.c_f);
    let fine_root =
        ChanVeseModel::refined(image.clone(), c_b, c_f, config.refine_radius, config.mu);
    let guess = (config.strategy == StrategyV1::DepthFirst).then(|| {
        ChanVeseModel::new(
            image.clone(),
            IntensityRange::new(c_b, c_b),
            IntensityRange::new(c_f, c_f),
            config.mu,
        )
    });
    let fine = segment_with_root(image, config, config.lambda, fine_root, guess)?;
    Ok(CoarseToFineRun { coarse, fine })
}

/// Run one search from an explicit root.
///
/// # Errors
///
/// Same as [`segment`], plus [`RunError::InvalidWindow`] if `root` or
/// `initial_guess` holds an empty or off-scale window.
pub fn segment_with_root(
    image: &IntensityImage,
    config: &SegmentationConfig,
    lambda: i64,
    root: ChanVeseModel,
    initial_guess: Option<ChanVeseModel>,
) -> Result<SegmentationRun, RunError> {
    for model in std::iter::once(&root).chain(initial_guess.as_ref()) {
        if !model.is_well_formed() {
            return Err(RunError::InvalidWindow {
                c_b: [model.background.min, model.background.max],
                c_f: [model.foreground.min, model.foreground.max],
            });
        }
    }
    let snapshot = build_config_snapshot(config)?;
    let dims = image.dims();
    let pairwise = chan_vese_pairwise(dims, lambda)?;
    let bias = chan_vese_bias(dims, config.mu);

    let mut prepared = PreparedGraph::prepare(dims);
    let SearchResult {
        best,
        trace,
        evaluations,
    } = search(
        &mut prepared,
        &pairwise,
        Some(&bias),
        root,
        initial_guess,
        &config.search_policy(),
    )?;
    let trace_digest = trace.digest()?;
    let optimal = matches!(
        trace.metadata.termination_reason,
        TerminationReasonV1::OptimumPopped { .. } | TerminationReasonV1::TreeExhausted
    );

    let energy = best
        .as_ref()
        .and_then(|b| b.node.bound())
        .and_then(Bound::finite);
    let (Some(best), Some(energy)) = (best, energy) else {
        return Err(RunError::NoSolution {
            termination: trace.metadata.termination_reason,
        });
    };
    let model = best.node.into_model();

    let report = SegmentationReportV1 {
        width: dims.width,
        height: dims.height,
        c_b: model.background.min,
        c_f: model.foreground.min,
        energy,
        labeling: best.labeling,
        evaluations,
        optimal,
        trace_digest,
        config_digest: snapshot.digest,
    };
    Ok(SegmentationRun { report, trace })
}
