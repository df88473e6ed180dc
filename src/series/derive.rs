//! Pure derivations over normalized series.
//!
//! Every function here drops a point whose result would be undefined
//! (missing partner, zero denominator, non-finite arithmetic) instead of
//! emitting NaN, zero, or an approximation. Inputs are assumed to be
//! ascending with unique keys (the normalizer's contract); outputs keep that.

use std::collections::HashMap;

use crate::domain::{NormalizedPoint, PeriodKey};
use crate::error::PipelineError;

/// Year-over-year lag for quarterly series.
pub const QUARTERLY_LAG: u32 = 4;
/// Year-over-year lag for monthly series.
pub const MONTHLY_LAG: u32 = 12;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn percent_change(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 || !prior.is_finite() || !current.is_finite() {
        return None;
    }
    let change = (current - prior) / prior * 100.0;
    change.is_finite().then_some(change)
}

/// Unrounded YoY percent change.
///
/// The partner of a point is the point `lag` sub-periods earlier; points
/// without one are dropped.
pub fn year_over_year_unrounded(series: &[NormalizedPoint], lag: u32) -> Vec<NormalizedPoint> {
    let by_key: HashMap<PeriodKey, f64> = series.iter().map(|p| (p.key, p.value)).collect();
    series
        .iter()
        .filter_map(|p| {
            let prior = by_key.get(&p.key.back(lag))?;
            percent_change(p.value, *prior).map(|change| p.with_value(change))
        })
        .collect()
}

/// YoY percent change rounded to one decimal.
pub fn year_over_year(series: &[NormalizedPoint], lag: u32) -> Vec<NormalizedPoint> {
    year_over_year_unrounded(series, lag)
        .into_iter()
        .map(|p| {
            let value = round_to(p.value, 1);
            NormalizedPoint { value, ..p }
        })
        .collect()
}

/// `nominal / (index / 100)` for every period present in both series.
pub fn deflate(nominal: &[NormalizedPoint], index: &[NormalizedPoint]) -> Vec<NormalizedPoint> {
    let by_key: HashMap<PeriodKey, f64> = index.iter().map(|p| (p.key, p.value)).collect();
    nominal
        .iter()
        .filter_map(|p| {
            let idx = *by_key.get(&p.key)?;
            if idx == 0.0 {
                return None;
            }
            let real = p.value / (idx / 100.0);
            real.is_finite().then(|| p.with_value(real))
        })
        .collect()
}

/// Percent change of every point against the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSeries {
    pub baseline_label: String,
    pub points: Vec<NormalizedPoint>,
}

/// Re-express `series` relative to its first point (which becomes 0.0),
/// rounded to one decimal. `None` if the series is empty or the baseline
/// cannot divide.
pub fn cumulative_index(series: &[NormalizedPoint]) -> Option<CumulativeSeries> {
    let baseline = series.first()?;
    if baseline.value == 0.0 || !baseline.value.is_finite() {
        return None;
    }
    let points = series
        .iter()
        .filter_map(|p| percent_change(p.value, baseline.value).map(|c| p.with_value(round_to(c, 1))))
        .collect();
    Some(CumulativeSeries {
        baseline_label: baseline.label.clone(),
        points,
    })
}

/// One weighted input to [`weighted_composite`].
#[derive(Debug, Clone, Copy)]
pub struct Component<'a> {
    pub name: &'static str,
    pub weight: f64,
    pub series: &'a [NormalizedPoint],
}

/// Composite value next to the unweighted headline at one period.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePoint {
    pub key: PeriodKey,
    pub label: String,
    pub composite: f64,
    pub headline: f64,
}

/// Weighted average of aligned component series, carried next to `headline`.
///
/// A period is emitted only when every component and the headline have a
/// value for it. Weights are divided by their sum, so they need not add to 1.
/// Output values are rounded to one decimal.
pub fn weighted_composite(
    components: &[Component<'_>],
    headline: &[NormalizedPoint],
) -> Result<Vec<CompositePoint>, PipelineError> {
    if components.is_empty() {
        return Err(PipelineError::Weights("no components".to_string()));
    }
    if let Some(bad) = components.iter().find(|c| !c.weight.is_finite() || c.weight < 0.0) {
        return Err(PipelineError::Weights(format!(
            "weight for {} must be finite and non-negative, got {}",
            bad.name, bad.weight
        )));
    }
    let total_weight: f64 = components.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return Err(PipelineError::Weights("weights sum to zero".to_string()));
    }

    let lookups: Vec<HashMap<PeriodKey, f64>> = components
        .iter()
        .map(|c| c.series.iter().map(|p| (p.key, p.value)).collect())
        .collect();

    let out = headline
        .iter()
        .filter_map(|h| {
            let mut weighted = 0.0;
            for (component, lookup) in components.iter().zip(&lookups) {
                weighted += component.weight * lookup.get(&h.key)?;
            }
            let composite = weighted / total_weight;
            if !composite.is_finite() || !h.value.is_finite() {
                return None;
            }
            Some(CompositePoint {
                key: h.key,
                label: h.label.clone(),
                composite: round_to(composite, 1),
                headline: round_to(h.value, 1),
            })
        })
        .collect();
    Ok(out)
}

/// The most recent `n` items, oldest first.
pub fn tail<T: Clone>(series: &[T], n: usize) -> Vec<T> {
    series[series.len().saturating_sub(n)..].to_vec()
}
