//! Series-level types shared by the adapters, the normalizer and the
//! derivation engine.

use std::collections::HashMap;
use std::fmt;

/// A single raw `(period, value)` pair as reported by an upstream source.
///
/// `period` keeps the source's code (`M01`..`M12`, `Q01`..`Q04`, `M13` for an
/// annual average). `value` is kept raw so that sentinel filtering happens in
/// exactly one place (the normalizer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub year: i32,
    pub period: String,
    /// Human label of the period (`"January"`, `"Jan"`), when the source has one.
    pub period_name: Option<String>,
    pub value: Option<String>,
}

/// Chronological direction of an adapter's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}

/// Raw observations for one series, as returned by an adapter.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub series_id: String,
    pub order: SortOrder,
    pub observations: Vec<Observation>,
}

/// Adapter output keyed by series identifier.
pub type RawSeriesMap = HashMap<String, RawSeries>;

/// Canonical period identity.
///
/// Ordering is `(year, sub-period)` within one cadence. Series never mix
/// cadences, so the variant-first ordering of the derive is never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Quarter { year: i32, quarter: u32 },
    Month { year: i32, month: u32 },
}

impl PeriodKey {
    pub fn quarter(year: i32, quarter: u32) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(PeriodKey::Quarter { year, quarter })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(PeriodKey::Month { year, month })
    }

    pub fn year(self) -> i32 {
        match self {
            PeriodKey::Quarter { year, .. } | PeriodKey::Month { year, .. } => year,
        }
    }

    /// 1-based index of the sub-period within its year.
    pub fn sub_period(self) -> u32 {
        match self {
            PeriodKey::Quarter { quarter, .. } => quarter,
            PeriodKey::Month { month, .. } => month,
        }
    }

    fn periods_per_year(self) -> i64 {
        match self {
            PeriodKey::Quarter { .. } => 4,
            PeriodKey::Month { .. } => 12,
        }
    }

    /// The key `lag` sub-periods earlier (`lag = 4` on a quarter is the same
    /// quarter one year before).
    pub fn back(self, lag: u32) -> Self {
        let per_year = self.periods_per_year();
        let ordinal = i64::from(self.year()) * per_year + i64::from(self.sub_period()) - 1 - i64::from(lag);
        let year = ordinal.div_euclid(per_year) as i32;
        let sub = (ordinal.rem_euclid(per_year) + 1) as u32;
        match self {
            PeriodKey::Quarter { .. } => PeriodKey::Quarter { year, quarter: sub },
            PeriodKey::Month { .. } => PeriodKey::Month { year, month: sub },
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Quarter { year, quarter } => write!(f, "Q{quarter} {year}"),
            PeriodKey::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// One normalized (or derived) value at a canonical period.
///
/// `label` is what gets persisted (`"Q1 2024"`, `"January 2024"`); `key`
/// carries the ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub key: PeriodKey,
    pub label: String,
    pub value: f64,
}

impl NormalizedPoint {
    pub fn new(key: PeriodKey, label: impl Into<String>, value: f64) -> Self {
        Self {
            key,
            label: label.into(),
            value,
        }
    }

    /// Same period, different value.
    pub fn with_value(&self, value: f64) -> Self {
        Self {
            key: self.key,
            label: self.label.clone(),
            value,
        }
    }
}
