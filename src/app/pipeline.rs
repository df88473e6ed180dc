//! Per-source metric runs.
//!
//! Every run follows the same shape for each metric it owns:
//! fetch -> derive -> validate -> write, and on any failure fall back to the
//! file already on disk. A metric's failure never stops its siblings.
//!
//! Runs take the clock as an argument, so identical upstream data and an
//! identical `now` produce byte-identical files.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::MAX_HISTORY_YEARS;
use crate::data::bls::{ALL_SERIES, SNAPSHOT_FILE};
use crate::data::fred::{SERIES_CONSUMER_SENTIMENT, SERIES_HOUSEHOLD_DEBT_SERVICE, SERIES_SAHM_RULE};
use crate::data::shed::SHED_HISTORY;
use crate::data::{BlsClient, FredClient, HttpTransport};
use crate::domain::{MetricId, RawSeriesMap};
use crate::error::PipelineError;
use crate::io::{MetricStore, RawStore};
use crate::metrics;
use crate::validate::validate_output;

/// What happened to one metric file during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricOutcome {
    Written,
    /// The run failed for this metric; the previous file was left untouched.
    PreservedExisting { reason: String },
    /// The run failed and there was no previous file to keep.
    Missing { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricReport {
    pub metric: MetricId,
    pub outcome: MetricOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source: &'static str,
    pub metrics: Vec<MetricReport>,
}

impl RunReport {
    fn new(source: &'static str) -> Self {
        Self {
            source,
            metrics: Vec::new(),
        }
    }

    /// A run fails only when some metric ended up with no file at all.
    pub fn is_success(&self) -> bool {
        !self
            .metrics
            .iter()
            .any(|m| matches!(m.outcome, MetricOutcome::Missing { .. }))
    }

    pub fn outcome(&self, metric: MetricId) -> Option<&MetricOutcome> {
        self.metrics.iter().find(|m| m.metric == metric).map(|m| &m.outcome)
    }
}

/// Keep whatever is on disk for `metric`, or report it missing.
fn fall_back(store: &MetricStore, metric: MetricId, reason: String) -> MetricReport {
    let outcome = if store.exists(metric) {
        warn!(%metric, %reason, "keeping existing data");
        MetricOutcome::PreservedExisting { reason }
    } else {
        error!(%metric, %reason, path = %store.path(metric).display(), "no existing data to fall back to");
        MetricOutcome::Missing { reason }
    };
    MetricReport { metric, outcome }
}

/// Validate and write a derived metric, or fall back.
fn settle<T: Serialize>(store: &MetricStore, metric: MetricId, derived: Result<T, PipelineError>) -> MetricReport {
    let written = derived
        .and_then(|output| validate_output(metric, &output))
        .and_then(|value| store.write_metric(metric, &value));
    match written {
        Ok(path) => {
            info!(%metric, path = %path.display(), "metric data validated and saved");
            MetricReport {
                metric,
                outcome: MetricOutcome::Written,
            }
        }
        Err(err) => fall_back(store, metric, err.to_string()),
    }
}

/// Years of history a run actually requests.
fn bounded_years(history_years: u32) -> u32 {
    if history_years > MAX_HISTORY_YEARS {
        warn!(requested = history_years, max = MAX_HISTORY_YEARS, "history window clamped");
    }
    history_years.min(MAX_HISTORY_YEARS)
}

/// Fetch every BLS series in one request and derive both BLS metrics.
///
/// The raw response is snapshotted into `raw` first; a failed snapshot is
/// logged and does not affect the metrics.
pub fn run_bls<T: HttpTransport>(
    client: &BlsClient<T>,
    store: &MetricStore,
    raw: &RawStore,
    history_years: u32,
    now: DateTime<Utc>,
) -> RunReport {
    let mut report = RunReport::new("BLS");
    let end_year = now.year();
    let start_year = end_year.saturating_sub_unsigned(bounded_years(history_years));
    info!(start_year, end_year, "updating BLS metrics");

    match client.fetch(&ALL_SERIES, start_year, end_year) {
        Ok(fetched) => {
            match raw.write_snapshot(SNAPSHOT_FILE, &fetched.raw) {
                Ok(path) => info!(path = %path.display(), "raw BLS response saved"),
                Err(err) => warn!(error = %err, "could not save raw BLS response"),
            }
            let stamp = metrics::timestamp(now);
            report.metrics.push(settle(
                store,
                MetricId::PurchasingPower,
                metrics::purchasing_power(&fetched.series, &stamp),
            ));
            report.metrics.push(settle(
                store,
                MetricId::EssentialsInflation,
                metrics::essentials_inflation(&fetched.series, &stamp),
            ));
        }
        Err(err) => {
            let reason = err.to_string();
            for metric in [MetricId::PurchasingPower, MetricId::EssentialsInflation] {
                report.metrics.push(fall_back(store, metric, reason.clone()));
            }
        }
    }
    report
}

type Recipe<O> = fn(&RawSeriesMap, &str) -> Result<O, PipelineError>;

fn fred_window(now: DateTime<Utc>, history_years: u32) -> (NaiveDate, NaiveDate) {
    let end = now.date_naive();
    let span = TimeDelta::days(365 * i64::from(bounded_years(history_years)));
    let start = end.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
    (start, end)
}

fn fred_metric<T: HttpTransport, O: Serialize>(
    client: &FredClient<T>,
    store: &MetricStore,
    metric: MetricId,
    series_id: &str,
    (start, end): (NaiveDate, NaiveDate),
    stamp: &str,
    recipe: Recipe<O>,
) -> MetricReport {
    let derived = client
        .fetch_series(&[series_id], start, end)
        .and_then(|raw| recipe(&raw, stamp));
    settle(store, metric, derived)
}

/// Fetch and derive each FRED metric on its own.
pub fn run_fred<T: HttpTransport>(
    client: &FredClient<T>,
    store: &MetricStore,
    history_years: u32,
    now: DateTime<Utc>,
) -> RunReport {
    let mut report = RunReport::new("FRED");
    let window = fred_window(now, history_years);
    let stamp = metrics::timestamp(now);
    info!(start = %window.0, end = %window.1, "updating FRED metrics");

    report.metrics.push(fred_metric(
        client,
        store,
        MetricId::ConsumerSentiment,
        SERIES_CONSUMER_SENTIMENT,
        window,
        &stamp,
        metrics::consumer_sentiment,
    ));
    report.metrics.push(fred_metric(
        client,
        store,
        MetricId::SahmRule,
        SERIES_SAHM_RULE,
        window,
        &stamp,
        metrics::sahm_rule,
    ));
    report.metrics.push(fred_metric(
        client,
        store,
        MetricId::HouseholdDebt,
        SERIES_HOUSEHOLD_DEBT_SERVICE,
        window,
        &stamp,
        metrics::household_debt,
    ));
    report
}

/// Rewrite the financial cushion file from the curated SHED table.
pub fn run_shed(store: &MetricStore, now: DateTime<Utc>) -> RunReport {
    let mut report = RunReport::new("SHED");
    let stamp = metrics::timestamp(now);
    report.metrics.push(settle(
        store,
        MetricId::FinancialCushion,
        metrics::financial_cushion(&SHED_HISTORY, &stamp),
    ));
    report
}
