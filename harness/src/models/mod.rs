//! Concrete branch models driven by the runner.

pub mod chan_vese;
