//! Branchcut Search: branch-and-bound over parameter space with an
//! incremental min-cut lower bound.
//!
//! This crate provides the search layer. It depends only on
//! `branchcut_kernel`; it does NOT depend on `branchcut_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! branchcut_kernel  ←  branchcut_search  ←  branchcut_harness
//! (grid, max-flow)     (evaluator, engine)   (models, runner, reports)
//! ```
//!
//! # Key types
//!
//! - [`BranchModel`] -- the node contract a concrete energy model implements
//! - [`SearchNodeV1`] -- engine-owned node: identity, depth, bound
//! - [`PreparedGraph`] -- persistent graph and terminal caches for one grid size
//! - [`SearchContext`] -- per-search state; hosts the bound evaluator
//! - [`search()`] -- best-first or depth-first branch-and-bound
//! - [`SearchTraceV1`] -- evaluation-event audit log
//! - [`Bound`] -- lower bound with explicit infinities

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bound;
pub mod context;
pub mod contract;
pub mod error;
pub mod evaluator;
pub mod frontier;
pub mod node;
pub mod policy;
pub mod search;
pub mod trace;

pub use bound::Bound;
pub use context::{BestSolutionV1, PreparedGraph, SearchContext};
pub use contract::BranchModel;
pub use error::SearchError;
pub use node::SearchNodeV1;
pub use policy::{PruneHintPolicyV1, SearchPolicyV1, StrategyV1};
pub use search::{search, SearchResult};
pub use trace::{SearchTraceV1, TerminationReasonV1};
