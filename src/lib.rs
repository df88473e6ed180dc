//! `household-metrics` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - every pipeline stage is testable without network or processes
//! - adapters, derivations and validation stay independent of the CLI

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod series;
pub mod validate;
