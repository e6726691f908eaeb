//! Per-wave aggregation into time series.

pub mod aggregate;

pub use aggregate::*;
