//! Command-line parsing for the household metrics updater.
//!
//! Parsing stays here; dispatch lives in `app`.

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "household-metrics",
    version,
    about = "Fetch, derive, validate and persist household economic indicators"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Update purchasing power and essentials inflation from BLS.
    Bls,
    /// Update consumer sentiment, the Sahm rule and household debt service from FRED.
    ///
    /// Requires FRED_API_KEY.
    Fred,
    /// Rewrite the financial cushion file from the curated SHED table.
    Shed,
    /// Run the BLS, FRED and SHED updates in turn.
    All,
    /// Check that every metric file exists, validates and is recent.
    Check,
}
