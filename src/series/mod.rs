//! Series normalization and derivations.
//!
//! - `normalize`: raw period codes → canonical, ascending, de-duplicated points
//! - `derive`: YoY, deflation, cumulative index, weighted composite, windowing

pub mod derive;
pub mod normalize;

pub use derive::*;
pub use normalize::*;
