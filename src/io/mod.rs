//! Input/output helpers.
//!
//! - metric file and raw snapshot persistence (`store`)
//! - existence, schema and freshness check over persisted files (`check`)

pub mod check;
pub mod store;

pub use check::*;
pub use store::*;
