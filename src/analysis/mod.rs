//! Analysis modules.
//!
//! Scoring of assessments into per-domain summaries.

pub mod aggregator;

pub use aggregator::*;
