//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - survey waves and their chronological ordering (`Wave`)
//! - filtered observation collections (`Sample`)
//! - statistic records (`WeightedStatistics`, `RateEstimate`)
//! - ordered series outputs (`TimeSeries`, `SkippedWave`)
//! - run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
