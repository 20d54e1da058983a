//! Branchcut Kernel: grid geometry, the min-cut collaborator, and canonical hashing.
//!
//! # API Surface
//!
//! - [`grid`] -- grid dimensions, the four-neighbour pairwise grid, labelings
//!   and their energy
//! - [`graph`] -- the [`graph::CutGraph`] collaborator trait and the
//!   warm-startable [`graph::residual::ResidualGraph`] max-flow
//! - [`proof`] -- canonical JSON bytes and domain-separated SHA-256 digests
//!
//! # Module Dependency Direction
//!
//! `grid` ← `graph`, `proof` stands alone.
//!
//! One-way only. No cycles.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod graph;
pub mod grid;
pub mod proof;
