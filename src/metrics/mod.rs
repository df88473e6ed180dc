//! Metric recipes: raw series in, persisted metric objects out.
//!
//! Each recipe is a pure function of the adapter output and the run
//! timestamp, so the same inputs always produce byte-identical files.

pub mod bls;
pub mod cushion;
pub mod fred;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{RawSeries, RawSeriesMap};
use crate::error::PipelineError;

pub use bls::{essentials_inflation, purchasing_power};
pub use cushion::financial_cushion;
pub use fred::{consumer_sentiment, household_debt, sahm_rule};

/// `lastUpdated` rendering: RFC 3339, UTC, milliseconds, `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn series<'a>(raw: &'a RawSeriesMap, series_id: &str) -> Result<&'a RawSeries, PipelineError> {
    raw.get(series_id).ok_or_else(|| PipelineError::MissingSeries {
        series_id: series_id.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::domain::{Observation, RawSeries, RawSeriesMap, SortOrder};

    /// `months` of `year` at a flat `value`, in the given order.
    pub fn flat_months(year: i32, months: std::ops::RangeInclusive<u32>, value: f64) -> Vec<Observation> {
        months
            .map(|m| Observation {
                year,
                period: format!("M{m:02}"),
                period_name: None,
                value: Some(value.to_string()),
            })
            .collect()
    }

    pub fn raw_map(entries: Vec<(&str, SortOrder, Vec<Observation>)>) -> RawSeriesMap {
        entries
            .into_iter()
            .map(|(id, order, observations)| {
                (
                    id.to_string(),
                    RawSeries {
                        series_id: id.to_string(),
                        order,
                        observations,
                    },
                )
            })
            .collect()
    }
}
