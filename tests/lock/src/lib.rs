//! Shared fixtures for the lock tests and the cross-process fixture binary.
//!
//! - [`canonical_search`] -- the one segmentation every determinism check runs
//! - [`enumeration`] -- brute-force oracles for tiny grids
//! - [`table_model`] -- an unstructured enumerable model

pub mod canonical_search;
pub mod enumeration;
pub mod table_model;
