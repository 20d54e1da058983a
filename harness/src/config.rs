//! Segmentation configuration and its auditable snapshot.
//!
//! The snapshot is the canonical JSON of every knob that can change a
//! result, so a report can be traced back to the exact configuration that
//! produced it.

use branchcut_kernel::proof::canon::canonical_json_bytes;
use branchcut_kernel::proof::hash::{canonical_hash, ContentHash};
use branchcut_kernel::proof::hash_domain::HashDomain;
use branchcut_search::{PruneHintPolicyV1, SearchPolicyV1, StrategyV1};

/// Knobs for one segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationConfig {
    /// Boundary penalty between orthogonal neighbours.
    pub lambda: i64,
    /// Per-pixel foreground bias.
    pub mu: i64,
    pub strategy: StrategyV1,
    pub max_evaluations: u64,
    pub prune_hint: PruneHintPolicyV1,
    /// Block size of the coarse pass in coarse-to-fine mode.
    pub coarse_factor: usize,
    /// Half-width of the `c_b` / `c_f` windows in the fine pass.
    pub refine_radius: i64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            lambda: 10_000,
            mu: 0,
            strategy: StrategyV1::BestFirst,
            max_evaluations: 1_000_000,
            prune_hint: PruneHintPolicyV1::Ignore,
            coarse_factor: 4,
            refine_radius: 10,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NegativeLambda { lambda: i64 },
    ZeroCoarseFactor,
    NegativeRefineRadius { radius: i64 },
    ZeroEvaluationBudget,
    /// Canonical JSON serialization failed.
    CanonError { detail: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeLambda { lambda } => write!(f, "lambda must be >= 0, got {lambda}"),
            Self::ZeroCoarseFactor => f.write_str("coarse_factor must be at least 1"),
            Self::NegativeRefineRadius { radius } => {
                write!(f, "refine_radius must be >= 0, got {radius}")
            }
            Self::ZeroEvaluationBudget => f.write_str("max_evaluations must be at least 1"),
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SegmentationConfig {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lambda < 0 {
            return Err(ConfigError::NegativeLambda {
                lambda: self.lambda,
            });
        }
        if self.coarse_factor == 0 {
            return Err(ConfigError::ZeroCoarseFactor);
        }
        if self.refine_radius < 0 {
            return Err(ConfigError::NegativeRefineRadius {
                radius: self.refine_radius,
            });
        }
        if self.max_evaluations == 0 {
            return Err(ConfigError::ZeroEvaluationBudget);
        }
        Ok(())
    }

    /// The search policy this configuration implies.
    #[must_use]
    pub fn search_policy(&self) -> SearchPolicyV1 {
        SearchPolicyV1 {
            strategy: self.strategy,
            max_evaluations: self.max_evaluations,
            prune_hint: self.prune_hint,
        }
    }
}

/// In-memory configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshotV1 {
    /// Canonical JSON bytes of the snapshot.
    pub bytes: Vec<u8>,
    /// `canonical_hash(ConfigSnapshot, bytes)`.
    pub digest: ContentHash,
}

/// Validate `config` and snapshot it.
///
/// # Errors
///
/// Returns [`ConfigError`] if validation or canonical JSON serialization fails.
pub fn build_config_snapshot(config: &SegmentationConfig) -> Result<ConfigSnapshotV1, ConfigError> {
    config.validate()?;
    let value = serde_json::json!({
        "coarse_factor": config.coarse_factor,
        "lambda": config.lambda,
        "max_evaluations": config.max_evaluations,
        "mu": config.mu,
        "prune_hint": config.prune_hint.as_str(),
        "refine_radius": config.refine_radius,
        "schema_version": "segmentation_config.v1",
        "strategy": config.strategy.as_str(),
    });
    let bytes = canonical_json_bytes(&value).map_err(|e| ConfigError::CanonError {
        detail: format!("{e:?}"),
    })?;
    let digest = canonical_hash(HashDomain::ConfigSnapshot, &bytes);
    Ok(ConfigSnapshotV1 { bytes, digest })
}
