//! Input/output helpers.
//!
//! - wave-file discovery + household pairing (`waves`)
//! - CSV ingest + sample extraction (`ingest`)
//! - series exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod waves;

pub use export::*;
pub use ingest::*;
pub use waves::*;
