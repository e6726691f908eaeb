//! The weighted statistics engine.
//!
//! This is the algorithmic core of the crate: everything else is ingest,
//! orchestration or presentation around these three reductions.
//!
//! - `quantile`: weighted quantiles via sort + cumulative-weight lookup
//! - `summary`: full distribution summary for one variable
//! - `rate`: weighted share of a 0/1 indicator as a percentage

pub mod quantile;
pub mod rate;
pub mod summary;

pub use quantile::{SortedSample, weighted_quantile};
pub use rate::weighted_rate;
pub use summary::summarize;
