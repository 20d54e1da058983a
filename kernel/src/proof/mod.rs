//! Proof module: canonical JSON serialization and content hashing.
//!
//! Nothing in `proof` depends on `grid` or `graph`.

pub mod canon;
pub mod hash;
pub mod hash_domain;
