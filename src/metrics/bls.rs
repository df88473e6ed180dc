//! Purchasing power and essentials inflation, both derived from one BLS
//! response. The two recipes do not depend on each other.

use crate::data::bls::{
    SERIES_CPI_ALL_ITEMS, SERIES_CPI_ENERGY, SERIES_CPI_FOOD_AT_HOME, SERIES_CPI_MEDICAL_CARE, SERIES_CPI_SHELTER,
    SERIES_CPI_TRANSPORTATION, SERIES_MEDIAN_WEEKLY_EARNINGS,
};
use crate::domain::{EssentialsInflation, EssentialsPoint, NormalizedPoint, PurchasingPower, RawSeriesMap, chart_points};
use crate::error::PipelineError;
use crate::metrics::series;
use crate::series::{
    Component, MONTHLY_LAG, QUARTERLY_LAG, cumulative_index, deflate, normalize_to_monthly, normalize_to_quarterly,
    tail, weighted_composite, year_over_year, year_over_year_unrounded,
};

/// Quarters kept in the purchasing power chart.
pub const PURCHASING_POWER_WINDOW: usize = 40;
/// Months kept in the essentials chart.
pub const ESSENTIALS_WINDOW: usize = 12;

/// `(component, series id, weight)` for the essentials composite.
pub const ESSENTIALS_WEIGHTS: [(&str, &str, f64); 5] = [
    ("shelter", SERIES_CPI_SHELTER, 0.33),
    ("food", SERIES_CPI_FOOD_AT_HOME, 0.13),
    ("energy", SERIES_CPI_ENERGY, 0.07),
    ("transport", SERIES_CPI_TRANSPORTATION, 0.17),
    ("medical", SERIES_CPI_MEDICAL_CARE, 0.08),
];

fn latest(points: &[NormalizedPoint], metric: &'static str, what: &str) -> Result<f64, PipelineError> {
    points
        .last()
        .map(|p| p.value)
        .ok_or_else(|| PipelineError::InsufficientData {
            metric,
            reason: format!("no {what} points"),
        })
}

/// Real median weekly earnings, year over year and cumulative.
pub fn purchasing_power(raw: &RawSeriesMap, last_updated: &str) -> Result<PurchasingPower, PipelineError> {
    const METRIC: &str = "purchasing power";

    let earnings = normalize_to_quarterly(&series(raw, SERIES_MEDIAN_WEEKLY_EARNINGS)?.observations);
    let cpi = normalize_to_quarterly(&series(raw, SERIES_CPI_ALL_ITEMS)?.observations);

    let real = deflate(&earnings, &cpi);
    let yoy = tail(&year_over_year(&real, QUARTERLY_LAG), PURCHASING_POWER_WINDOW);
    let value = latest(&yoy, METRIC, "year-over-year")?;

    let cumulative = cumulative_index(&real).ok_or_else(|| PipelineError::InsufficientData {
        metric: METRIC,
        reason: "no usable baseline for the cumulative index".to_string(),
    })?;
    let cumulative_points = tail(&cumulative.points, PURCHASING_POWER_WINDOW);
    let cumulative_value = latest(&cumulative_points, METRIC, "cumulative")?;

    Ok(PurchasingPower {
        value,
        data: chart_points(&yoy),
        cumulative_value,
        cumulative_data: chart_points(&cumulative_points),
        baseline_date: cumulative.baseline_label,
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}

/// Weighted essentials basket inflation next to headline CPI.
pub fn essentials_inflation(raw: &RawSeriesMap, last_updated: &str) -> Result<EssentialsInflation, PipelineError> {
    let monthly_yoy = |series_id: &str| -> Result<Vec<NormalizedPoint>, PipelineError> {
        let raw_series = series(raw, series_id)?;
        let normalized = normalize_to_monthly(&raw_series.observations, raw_series.order);
        Ok(year_over_year_unrounded(&normalized, MONTHLY_LAG))
    };

    let component_yoy = ESSENTIALS_WEIGHTS
        .iter()
        .map(|&(_, series_id, _)| monthly_yoy(series_id))
        .collect::<Result<Vec<_>, _>>()?;
    let headline = monthly_yoy(SERIES_CPI_ALL_ITEMS)?;

    let components: Vec<Component<'_>> = ESSENTIALS_WEIGHTS
        .iter()
        .zip(&component_yoy)
        .map(|(&(name, _, weight), series)| Component { name, weight, series })
        .collect();

    let composite = tail(&weighted_composite(&components, &headline)?, ESSENTIALS_WINDOW);
    let Some(current) = composite.last() else {
        return Err(PipelineError::InsufficientData {
            metric: "essentials inflation",
            reason: "no month has every component and the headline".to_string(),
        });
    };

    Ok(EssentialsInflation {
        value: current.composite,
        headline_cpi: current.headline,
        data: composite
            .iter()
            .map(|p| EssentialsPoint {
                date: p.label.clone(),
                essentials: p.composite,
                headline: p.headline,
            })
            .collect(),
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, SortOrder};
    use crate::metrics::testing::{flat_months, raw_map};
    use pretty_assertions::assert_eq;

    const STAMP: &str = "2025-08-01T06:00:00.000Z";

    fn two_years(prior: f64, current: f64, current_months: std::ops::RangeInclusive<u32>) -> Vec<Observation> {
        // Newest first, as BLS delivers it.
        let mut obs = flat_months(2024, current_months, current);
        obs.reverse();
        let mut older = flat_months(2023, 1..=12, prior);
        older.reverse();
        obs.extend(older);
        obs
    }

    #[test]
    fn purchasing_power_from_flat_inputs() {
        let raw = raw_map(vec![
            (SERIES_MEDIAN_WEEKLY_EARNINGS, SortOrder::NewestFirst, two_years(1000.0, 1100.0, 1..=12)),
            (SERIES_CPI_ALL_ITEMS, SortOrder::NewestFirst, two_years(300.0, 300.0, 1..=12)),
        ]);
        let out = purchasing_power(&raw, STAMP).unwrap();

        assert_eq!(out.value, 10.0);
        assert_eq!(
            out.data.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
            vec!["Q1 2024", "Q2 2024", "Q3 2024", "Q4 2024"]
        );
        assert_eq!(out.baseline_date, "Q1 2023");
        assert_eq!(out.cumulative_data.len(), 8);
        assert_eq!(out.cumulative_data[0].value, 0.0);
        assert_eq!(out.cumulative_value, 10.0);
        assert_eq!(out.last_updated, STAMP);
        assert!(!out.is_fallback);
    }

    #[test]
    fn purchasing_power_needs_a_year_of_history() {
        let raw = raw_map(vec![
            (SERIES_MEDIAN_WEEKLY_EARNINGS, SortOrder::NewestFirst, flat_months(2024, 1..=12, 1100.0)),
            (SERIES_CPI_ALL_ITEMS, SortOrder::NewestFirst, flat_months(2024, 1..=12, 300.0)),
        ]);
        let err = purchasing_power(&raw, STAMP).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }), "{err}");
    }

    #[test]
    fn purchasing_power_reports_missing_series() {
        let raw = raw_map(vec![(
            SERIES_CPI_ALL_ITEMS,
            SortOrder::NewestFirst,
            two_years(300.0, 300.0, 1..=12),
        )]);
        let err = purchasing_power(&raw, STAMP).unwrap_err();
        assert!(
            matches!(&err, PipelineError::MissingSeries { series_id } if series_id == SERIES_MEDIAN_WEEKLY_EARNINGS)
        );
    }

    fn essentials_inputs() -> RawSeriesMap {
        raw_map(vec![
            (SERIES_CPI_SHELTER, SortOrder::NewestFirst, two_years(100.0, 105.0, 1..=3)),
            (SERIES_CPI_FOOD_AT_HOME, SortOrder::NewestFirst, two_years(100.0, 102.0, 1..=3)),
            (SERIES_CPI_ENERGY, SortOrder::NewestFirst, two_years(100.0, 90.0, 1..=3)),
            (SERIES_CPI_TRANSPORTATION, SortOrder::NewestFirst, two_years(100.0, 101.0, 1..=3)),
            (SERIES_CPI_MEDICAL_CARE, SortOrder::NewestFirst, two_years(100.0, 103.0, 1..=3)),
            (SERIES_CPI_ALL_ITEMS, SortOrder::NewestFirst, two_years(100.0, 103.0, 1..=3)),
        ])
    }

    #[test]
    fn essentials_composite_uses_basket_weights() {
        let out = essentials_inflation(&essentials_inputs(), STAMP).unwrap();
        // (0.33*5 + 0.13*2 + 0.07*-10 + 0.17*1 + 0.08*3) / 0.78 = 2.077
        assert_eq!(out.value, 2.1);
        assert_eq!(out.headline_cpi, 3.0);
        assert_eq!(
            out.data.iter().map(|p| p.date.as_str()).collect::<Vec<_>>(),
            vec!["January 2024", "February 2024", "March 2024"]
        );
    }

    #[test]
    fn essentials_skips_month_missing_from_one_component() {
        let mut raw = essentials_inputs();
        // Energy lost February 2024.
        raw.get_mut(SERIES_CPI_ENERGY)
            .unwrap()
            .observations
            .retain(|o| !(o.year == 2024 && o.period == "M02"));
        let out = essentials_inflation(&raw, STAMP).unwrap();
        assert_eq!(
            out.data.iter().map(|p| p.date.as_str()).collect::<Vec<_>>(),
            vec!["January 2024", "March 2024"]
        );
    }

    #[test]
    fn essentials_window_keeps_last_twelve_months() {
        let mut raw = essentials_inputs();
        for id in ESSENTIALS_WEIGHTS.iter().map(|w| w.1).chain([SERIES_CPI_ALL_ITEMS]) {
            let mut obs = flat_months(2025, 1..=6, 110.0);
            obs.reverse();
            let entry = raw.get_mut(id).unwrap();
            obs.extend(two_years(100.0, 105.0, 1..=12));
            entry.observations = obs;
        }
        let out = essentials_inflation(&raw, STAMP).unwrap();
        assert_eq!(out.data.len(), ESSENTIALS_WINDOW);
        assert_eq!(out.data[0].date, "July 2024");
        assert_eq!(out.data.last().unwrap().date, "June 2025");
    }

    #[test]
    fn weights_are_the_published_basket() {
        let total: f64 = ESSENTIALS_WEIGHTS.iter().map(|w| w.2).sum();
        assert!((total - 0.78).abs() < 1e-9);
    }
}
