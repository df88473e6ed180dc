//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging and maps errors to exit codes; this
//! module parses the command line, builds configuration and clients once, and
//! turns run reports into a process outcome.

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::data::{BlsClient, FredClient};
use crate::error::{AppError, EXIT_FAILURE};
use crate::io::{MetricStore, RawStore, check_all};

pub mod pipeline;

use pipeline::{MetricOutcome, RunReport};

/// Entry point for the `household-metrics` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = Config::from_env();
    let store = MetricStore::new(&config.metrics_dir);
    let now = Utc::now();

    match cli.command {
        Command::Bls => finish(&[update_bls(&config, &store, now)?]),
        Command::Fred => finish(&[update_fred(&config, &store, now)?]),
        Command::Shed => finish(&[pipeline::run_shed(&store, now)]),
        Command::All => update_all(&config, &store, now),
        Command::Check => check(&store, now),
    }
}

fn update_bls(config: &Config, store: &MetricStore, now: DateTime<Utc>) -> Result<RunReport, AppError> {
    let client = BlsClient::new(config.bls_api_key.clone())?;
    let raw = RawStore::new(&config.raw_dir);
    Ok(pipeline::run_bls(&client, store, &raw, config.history_years, now))
}

fn update_fred(config: &Config, store: &MetricStore, now: DateTime<Utc>) -> Result<RunReport, AppError> {
    let api_key = config.require_fred_key().map_err(|err| {
        error!(error = %err, "cannot update FRED metrics");
        AppError::from(err)
    })?;
    let client = FredClient::new(api_key.to_string())?;
    Ok(pipeline::run_fred(&client, store, config.history_years, now))
}

/// Every source runs even if an earlier one could not start.
fn update_all(config: &Config, store: &MetricStore, now: DateTime<Utc>) -> Result<(), AppError> {
    let mut reports = Vec::new();
    let mut setup_failures = Vec::new();

    for (source, result) in [
        ("BLS", update_bls(config, store, now)),
        ("FRED", update_fred(config, store, now)),
        ("SHED", Ok(pipeline::run_shed(store, now))),
    ] {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                error!(source, error = %err, "source update could not start");
                setup_failures.push(format!("{source}: {err}"));
            }
        }
    }

    let outcome = finish(&reports);
    if setup_failures.is_empty() {
        outcome
    } else {
        Err(AppError::new(EXIT_FAILURE, setup_failures.join("; ")))
    }
}

/// Log a summary per source; fail if any metric has no file.
fn finish(reports: &[RunReport]) -> Result<(), AppError> {
    let mut missing = Vec::new();
    for report in reports {
        let written = report
            .metrics
            .iter()
            .filter(|m| m.outcome == MetricOutcome::Written)
            .count();
        info!(
            source = report.source,
            written,
            total = report.metrics.len(),
            "{} update complete",
            report.source
        );
        for m in &report.metrics {
            if let MetricOutcome::Missing { reason } = &m.outcome {
                missing.push(format!("{} ({reason})", m.metric));
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::new(
            EXIT_FAILURE,
            format!("no data available for: {}", missing.join(", ")),
        ))
    }
}

fn check(store: &MetricStore, now: DateTime<Utc>) -> Result<(), AppError> {
    let checks = check_all(store, now);
    let failed: Vec<String> = checks
        .iter()
        .filter(|c| !c.is_ok())
        .map(|c| c.metric.to_string())
        .collect();
    if failed.is_empty() {
        info!(files = checks.len(), "all metric files valid");
        Ok(())
    } else {
        Err(AppError::new(
            EXIT_FAILURE,
            format!("metric file check failed: {}", failed.join(", ")),
        ))
    }
}
