//! Report directory persistence: write/read/verify a segmentation run on disk.
//!
//! # Directory layout (`ReportDirectoryV1`)
//!
//! ```text
//! <dir>/
//!   report.json   - canonical JSON, SegmentationReportV1
//!   trace.json    - canonical JSON, SearchTraceV1
//!   digest.txt    - ASCII digest string over both files
//! ```
//!
//! The directory path is never part of any hash surface.
//!
//! # Fail-closed semantics
//!
//! - Missing file → error
//! - Extra file → error
//! - Non-canonical `report.json` → error
//! - `trace.json` not matching the report's `trace_digest` → error
//! - `digest.txt` not matching the recomputed digest → error

use std::collections::BTreeSet;
use std::path::Path;

use branchcut_kernel::proof::canon::canonical_json_bytes;
use branchcut_kernel::proof::hash::{canonical_hash, ContentHash};
use branchcut_kernel::proof::hash_domain::HashDomain;

use crate::runner::{ReportParseError, SegmentationReportV1, SegmentationRun};

const REPORT_FILENAME: &str = "report.json";
const TRACE_FILENAME: &str = "trace.json";
const DIGEST_FILENAME: &str = "digest.txt";

const EXPECTED_FILENAMES: &[&str] = &[REPORT_FILENAME, TRACE_FILENAME, DIGEST_FILENAME];

/// Error writing a report directory.
#[derive(Debug)]
pub enum ReportDirWriteError {
    /// I/O error during write.
    Io { detail: String },
    /// Canonical JSON serialization failed.
    CanonError { detail: String },
}

impl std::fmt::Display for ReportDirWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for ReportDirWriteError {}

/// Error reading a report directory.
#[derive(Debug)]
pub enum ReportDirReadError {
    /// I/O error during read.
    Io { detail: String },
    /// One of the three files is missing.
    MissingFile { filename: String },
    /// A file other than the three expected ones exists.
    ExtraFile { name: String },
    /// `report.json` could not be parsed.
    Report(ReportParseError),
    /// A JSON file is not in canonical form.
    NonCanonical { filename: String },
    /// `trace.json` does not hash to the report's `trace_digest`.
    TraceDigestMismatch { declared: String, actual: String },
    /// `digest.txt` content doesn't match the recomputed digest.
    DigestMismatch { stored: String, recomputed: String },
    /// Canonical JSON error during reconstruction.
    CanonError { detail: String },
}

impl std::fmt::Display for ReportDirReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingFile { filename } => write!(f, "missing file: {filename}"),
            Self::ExtraFile { name } => write!(f, "unexpected extra file: {name}"),
            Self::Report(e) => write!(f, "{e}"),
            Self::NonCanonical { filename } => write!(f, "{filename} is not canonical JSON"),
            Self::TraceDigestMismatch { declared, actual } => {
                write!(f, "trace digest mismatch: declared={declared}, actual={actual}")
            }
            Self::DigestMismatch { stored, recomputed } => {
                write!(
                    f,
                    "digest mismatch: stored={stored}, recomputed={recomputed}"
                )
            }
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for ReportDirReadError {}

/// A verified report directory.
#[derive(Debug, Clone)]
pub struct LoadedReportV1 {
    pub report: SegmentationReportV1,
    /// Canonical bytes of the trace, as stored.
    pub trace_bytes: Vec<u8>,
    pub digest: ContentHash,
}

/// Digest over both artifacts: each is hashed under
/// [`HashDomain::ReportArtifact`], and the canonical JSON of those two hashes
/// is hashed under [`HashDomain::ReportDigest`].
fn directory_digest(report_bytes: &[u8], trace_bytes: &[u8]) -> Result<ContentHash, String> {
    let basis = serde_json::json!({
        "report": canonical_hash(HashDomain::ReportArtifact, report_bytes).as_str(),
        "schema_version": "report_dir.v1",
        "trace": canonical_hash(HashDomain::ReportArtifact, trace_bytes).as_str(),
    });
    let basis_bytes = canonical_json_bytes(&basis).map_err(|e| format!("{e:?}"))?;
    Ok(canonical_hash(HashDomain::ReportDigest, &basis_bytes))
}

/// Write a run to `dir` in `ReportDirectoryV1` format. Returns the directory digest.
///
/// Creates the directory if it does not exist.
///
/// # Errors
///
/// Returns [`ReportDirWriteError`] on I/O failure or canonical JSON error.
pub fn write_report_dir(
    run: &SegmentationRun,
    dir: &Path,
) -> Result<ContentHash, ReportDirWriteError> {
    let canon = |e: branchcut_kernel::proof::canon::CanonError| ReportDirWriteError::CanonError {
        detail: format!("{e:?}"),
    };
    let report_bytes = run.report.to_canonical_json_bytes().map_err(canon)?;
    let trace_bytes = run.trace.to_canonical_json_bytes().map_err(canon)?;
    let digest = directory_digest(&report_bytes, &trace_bytes)
        .map_err(|detail| ReportDirWriteError::CanonError { detail })?;

    std::fs::create_dir_all(dir).map_err(|e| ReportDirWriteError::Io {
        detail: format!("create_dir_all: {e}"),
    })?;
    write_atomic(dir.join(REPORT_FILENAME), &report_bytes)?;
    write_atomic(dir.join(TRACE_FILENAME), &trace_bytes)?;
    write_atomic(dir.join(DIGEST_FILENAME), digest.as_str().as_bytes())?;

    Ok(digest)
}

/// Read and verify a `ReportDirectoryV1` directory.
///
/// # Errors
///
/// Returns [`ReportDirReadError`] on any validation failure.
pub fn read_report_dir(dir: &Path) -> Result<LoadedReportV1, ReportDirReadError> {
    let report_bytes = read_required(dir, REPORT_FILENAME)?;
    let trace_bytes = read_required(dir, TRACE_FILENAME)?;
    let digest_bytes = read_required(dir, DIGEST_FILENAME)?;

    for filename in list_files(dir)? {
        if !EXPECTED_FILENAMES.contains(&filename.as_str()) {
            return Err(ReportDirReadError::ExtraFile { name: filename });
        }
    }

    let report =
        SegmentationReportV1::from_json_bytes(&report_bytes).map_err(ReportDirReadError::Report)?;
    let recanon = report
        .to_canonical_json_bytes()
        .map_err(|e| ReportDirReadError::CanonError {
            detail: format!("{e:?}"),
        })?;
    if recanon != report_bytes {
        return Err(ReportDirReadError::NonCanonical {
            filename: REPORT_FILENAME.into(),
        });
    }

    let actual_trace = canonical_hash(HashDomain::SearchTrace, &trace_bytes);
    if actual_trace != report.trace_digest {
        return Err(ReportDirReadError::TraceDigestMismatch {
            declared: report.trace_digest.as_str().to_string(),
            actual: actual_trace.as_str().to_string(),
        });
    }

    let recomputed = directory_digest(&report_bytes, &trace_bytes)
        .map_err(|detail| ReportDirReadError::CanonError { detail })?;
    let stored = String::from_utf8_lossy(&digest_bytes).trim().to_string();
    if recomputed.as_str() != stored {
        return Err(ReportDirReadError::DigestMismatch {
            stored,
            recomputed: recomputed.as_str().to_string(),
        });
    }

    Ok(LoadedReportV1 {
        report,
        trace_bytes,
        digest: recomputed,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Write bytes to a path via temp file + rename.
fn write_atomic(path: impl AsRef<Path>, content: &[u8]) -> Result<(), ReportDirWriteError> {
    let path = path.as_ref();
    let dir = path.parent().ok_or_else(|| ReportDirWriteError::Io {
        detail: "no parent directory".into(),
    })?;

    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dir.join(temp_name);

    std::fs::write(&temp_path, content).map_err(|e| ReportDirWriteError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| ReportDirWriteError::Io {
        detail: format!("rename {} → {}: {e}", temp_path.display(), path.display()),
    })?;

    Ok(())
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, ReportDirReadError> {
    std::fs::read(dir.join(filename)).map_err(|_| ReportDirReadError::MissingFile {
        filename: filename.to_string(),
    })
}

/// Regular files in `dir`, temp files from `write_atomic` excluded.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, ReportDirReadError> {
    let mut files = BTreeSet::new();
    let entries = std::fs::read_dir(dir).map_err(|e| ReportDirReadError::Io {
        detail: format!("read_dir: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ReportDirReadError::Io {
            detail: format!("dir entry: {e}"),
        })?;
        let file_type = entry.file_type().map_err(|e| ReportDirReadError::Io {
            detail: format!("file_type: {e}"),
        })?;
        if file_type.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with(".tmp_") {
                    files.insert(name.to_string());
                }
            }
        }
    }

    Ok(files)
}
