//! Branchcut Harness: a worked two-intensity segmentation on top of the search.
//!
//! The harness supplies what the search treats as external: a concrete
//! [`models::chan_vese::ChanVeseModel`], the pairwise grid and bias it
//! implies, a validated [`config::SegmentationConfig`], and persistence of
//! the result as a self-verifying report directory.
//!
//! The harness does NOT implement search logic; it delegates to
//! `branchcut_search`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod image;
pub mod models;
pub mod report_dir;
pub mod runner;
