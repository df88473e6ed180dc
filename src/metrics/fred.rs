//! Single-series FRED metrics.

use crate::data::fred::{SERIES_CONSUMER_SENTIMENT, SERIES_HOUSEHOLD_DEBT_SERVICE, SERIES_SAHM_RULE};
use crate::domain::{NormalizedPoint, RawSeriesMap, SahmRule, SeriesMetric, chart_points};
use crate::error::PipelineError;
use crate::metrics::series;
use crate::series::{normalize_to_monthly, normalize_to_quarterly, round_to, tail};

pub const SENTIMENT_WINDOW: usize = 36;
pub const SAHM_WINDOW: usize = 36;
pub const DEBT_WINDOW: usize = 24;

/// Sahm rule readings at or above this signal the start of a recession.
pub const RECESSION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Monthly,
    Quarterly,
}

fn prepare(
    raw: &RawSeriesMap,
    series_id: &str,
    cadence: Cadence,
    decimals: i32,
    window: usize,
    metric: &'static str,
) -> Result<(f64, Vec<NormalizedPoint>), PipelineError> {
    let raw_series = series(raw, series_id)?;
    let normalized = match cadence {
        Cadence::Monthly => normalize_to_monthly(&raw_series.observations, raw_series.order),
        Cadence::Quarterly => normalize_to_quarterly(&raw_series.observations),
    };
    let rounded: Vec<NormalizedPoint> = normalized
        .iter()
        .map(|p| p.with_value(round_to(p.value, decimals)))
        .collect();
    let windowed = tail(&rounded, window);
    let latest = windowed
        .last()
        .map(|p| p.value)
        .ok_or_else(|| PipelineError::InsufficientData {
            metric,
            reason: format!("{series_id} has no valid observations"),
        })?;
    Ok((latest, windowed))
}

/// University of Michigan consumer sentiment index.
pub fn consumer_sentiment(raw: &RawSeriesMap, last_updated: &str) -> Result<SeriesMetric, PipelineError> {
    let (value, points) = prepare(
        raw,
        SERIES_CONSUMER_SENTIMENT,
        Cadence::Monthly,
        1,
        SENTIMENT_WINDOW,
        "consumer sentiment",
    )?;
    Ok(SeriesMetric {
        value,
        data: chart_points(&points),
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}

/// Real-time Sahm rule recession indicator.
pub fn sahm_rule(raw: &RawSeriesMap, last_updated: &str) -> Result<SahmRule, PipelineError> {
    let (value, points) = prepare(raw, SERIES_SAHM_RULE, Cadence::Monthly, 2, SAHM_WINDOW, "sahm rule")?;
    Ok(SahmRule {
        value,
        is_recession_signal: value >= RECESSION_THRESHOLD,
        data: chart_points(&points),
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}

/// Household debt service payments as a percent of disposable income.
pub fn household_debt(raw: &RawSeriesMap, last_updated: &str) -> Result<SeriesMetric, PipelineError> {
    let (value, points) = prepare(
        raw,
        SERIES_HOUSEHOLD_DEBT_SERVICE,
        Cadence::Quarterly,
        1,
        DEBT_WINDOW,
        "household debt",
    )?;
    Ok(SeriesMetric {
        value,
        data: chart_points(&points),
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}
