//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw upstream observations and their canonical period keys (`types`)
//! - the persisted metric artifacts and the metric catalogue (`metrics`)

pub mod metrics;
pub mod types;

pub use metrics::*;
pub use types::*;
