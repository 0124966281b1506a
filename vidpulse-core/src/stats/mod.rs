//! Period-bounded delta aggregation
//!
//! The pipeline per request:
//! 1. resolve the period and classify its availability regime
//!    ([`crate::period`])
//! 2. compute per-video deltas from storage ([`delta`])
//! 3. roll the deltas up into totals and a leaderboard ([`rollup`])
//! 4. memoize the result ([`crate::cache`])
//!
//! [`engine::StatsEngine`] is the facade the command layer consumes.

pub mod delta;
pub mod engine;
pub mod rollup;

pub use engine::StatsEngine;
