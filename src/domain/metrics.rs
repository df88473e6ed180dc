//! Persisted metric artifacts.
//!
//! Field names follow the JSON contract read by the site (`camelCase`,
//! chart points keyed by `date`).

use serde::{Deserialize, Serialize};

use crate::domain::NormalizedPoint;

/// The metrics this crate maintains, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricId {
    PurchasingPower,
    EssentialsInflation,
    ConsumerSentiment,
    SahmRule,
    HouseholdDebt,
    FinancialCushion,
}

impl MetricId {
    pub const ALL: [MetricId; 6] = [
        MetricId::PurchasingPower,
        MetricId::EssentialsInflation,
        MetricId::ConsumerSentiment,
        MetricId::SahmRule,
        MetricId::HouseholdDebt,
        MetricId::FinancialCushion,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            MetricId::PurchasingPower => "purchasing-power.json",
            MetricId::EssentialsInflation => "essentials-inflation.json",
            MetricId::ConsumerSentiment => "consumer-sentiment.json",
            MetricId::SahmRule => "sahm-rule.json",
            MetricId::HouseholdDebt => "household-debt.json",
            MetricId::FinancialCushion => "financial-cushion.json",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MetricId::PurchasingPower => "Purchasing Power",
            MetricId::EssentialsInflation => "Essentials Inflation",
            MetricId::ConsumerSentiment => "Consumer Sentiment",
            MetricId::SahmRule => "Sahm Rule",
            MetricId::HouseholdDebt => "Household Debt Service Ratio",
            MetricId::FinancialCushion => "Financial Cushion",
        }
    }

    /// Age after which a persisted file is reported as stale.
    pub fn max_age_days(self) -> i64 {
        match self {
            MetricId::PurchasingPower | MetricId::HouseholdDebt => 120,
            MetricId::EssentialsInflation | MetricId::ConsumerSentiment | MetricId::SahmRule => 45,
            MetricId::FinancialCushion => 400,
        }
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A `(date label, value)` chart point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    #[serde(rename = "date")]
    pub label: String,
    pub value: f64,
}

impl From<&NormalizedPoint> for ChartPoint {
    fn from(p: &NormalizedPoint) -> Self {
        ChartPoint {
            label: p.label.clone(),
            value: p.value,
        }
    }
}

pub fn chart_points(series: &[NormalizedPoint]) -> Vec<ChartPoint> {
    series.iter().map(ChartPoint::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasingPower {
    pub value: f64,
    pub data: Vec<ChartPoint>,
    pub cumulative_value: f64,
    pub cumulative_data: Vec<ChartPoint>,
    pub baseline_date: String,
    pub last_updated: String,
    #[serde(default)]
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssentialsPoint {
    pub date: String,
    pub essentials: f64,
    pub headline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialsInflation {
    pub value: f64,
    #[serde(rename = "headlineCPI")]
    pub headline_cpi: f64,
    pub data: Vec<EssentialsPoint>,
    pub last_updated: String,
    #[serde(default)]
    pub is_fallback: bool,
}

/// Shape shared by single-series FRED metrics (sentiment, debt service).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetric {
    pub value: f64,
    pub data: Vec<ChartPoint>,
    pub last_updated: String,
    #[serde(default)]
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SahmRule {
    pub value: f64,
    pub is_recession_signal: bool,
    pub data: Vec<ChartPoint>,
    pub last_updated: String,
    #[serde(default)]
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CushionPoint {
    pub year: i32,
    #[serde(rename = "canCover400")]
    pub can_cover_400: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialCushion {
    #[serde(rename = "canCover400")]
    pub can_cover_400: f64,
    #[serde(rename = "cannotCover400")]
    pub cannot_cover_400: f64,
    #[serde(rename = "has3MonthSavings")]
    pub has_3_month_savings: f64,
    pub year: i32,
    pub data: Vec<CushionPoint>,
    pub last_updated: String,
    #[serde(default)]
    pub is_fallback: bool,
}
