//! Raw observations → canonical period series.
//!
//! Both normalizers share one rule set:
//! - sentinel and non-numeric values are dropped here, once, before any
//!   averaging (they never become zero)
//! - observations landing on the same canonical period are averaged
//! - a period with no valid observation is not emitted
//! - output is ascending by `(year, sub-period)` with unique keys
//!
//! Annual-average codes (`M13`, `Q05`) are not sub-periods and are skipped.

use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::{NormalizedPoint, Observation, PeriodKey, SortOrder};

const SENTINELS: [&str; 3] = ["", "-", "."];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A decoded source period code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodCode {
    Month(u32),
    Quarter(u32),
    /// `M13` / `Q05`: annual average.
    Annual,
}

/// Decode `M01`..`M13` and `Q01`..`Q05`.
pub fn parse_period_code(code: &str) -> Option<PeriodCode> {
    let code = code.trim();
    let (kind, digits) = code.split_at_checked(1)?;
    let n: u32 = digits.parse().ok()?;
    match (kind, n) {
        ("M", 1..=12) => Some(PeriodCode::Month(n)),
        ("M", 13) => Some(PeriodCode::Annual),
        ("Q", 1..=4) => Some(PeriodCode::Quarter(n)),
        ("Q", 5) => Some(PeriodCode::Annual),
        _ => None,
    }
}

/// Parse a raw value, treating sentinels and non-finite numbers as missing.
pub fn parse_value(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if SENTINELS.contains(&trimmed) {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[derive(Debug)]
struct Bucket {
    label: String,
    sum: f64,
    count: usize,
}

impl Bucket {
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let avg = self.sum / self.count as f64;
        avg.is_finite().then_some(avg)
    }
}

fn add(buckets: &mut BTreeMap<PeriodKey, Bucket>, key: PeriodKey, label: impl FnOnce() -> String, value: f64) {
    let bucket = buckets.entry(key).or_insert_with(|| Bucket {
        label: label(),
        sum: 0.0,
        count: 0,
    });
    bucket.sum += value;
    bucket.count += 1;
}

fn finish(buckets: BTreeMap<PeriodKey, Bucket>) -> Vec<NormalizedPoint> {
    buckets
        .into_iter()
        .filter_map(|(key, bucket)| bucket.mean().map(|value| NormalizedPoint::new(key, bucket.label, value)))
        .collect()
}

/// Group observations by quarter (`ceil(month / 3)` for monthly codes) and
/// average each group. Labels are `"Q<n> <year>"`.
pub fn normalize_to_quarterly(raw: &[Observation]) -> Vec<NormalizedPoint> {
    let mut buckets = BTreeMap::new();
    for obs in raw {
        let Some(value) = parse_value(obs.value.as_deref()) else {
            continue;
        };
        let quarter = match parse_period_code(&obs.period) {
            Some(PeriodCode::Quarter(q)) => q,
            Some(PeriodCode::Month(m)) => m.div_ceil(3),
            Some(PeriodCode::Annual) | None => continue,
        };
        let Some(key) = PeriodKey::quarter(obs.year, quarter) else {
            continue;
        };
        add(&mut buckets, key, || key.to_string(), value);
    }
    finish(buckets)
}

/// One point per month, labelled `"<period name> <year>"`.
///
/// `order` is the chronological direction of `raw` as delivered by the
/// adapter. Input that contradicts it is still sorted correctly, but logged.
pub fn normalize_to_monthly(raw: &[Observation], order: SortOrder) -> Vec<NormalizedPoint> {
    let oriented: Box<dyn Iterator<Item = &Observation>> = match order {
        SortOrder::OldestFirst => Box::new(raw.iter()),
        SortOrder::NewestFirst => Box::new(raw.iter().rev()),
    };

    let mut buckets = BTreeMap::new();
    let mut previous: Option<PeriodKey> = None;
    let mut out_of_order = 0usize;

    for obs in oriented {
        let Some(value) = parse_value(obs.value.as_deref()) else {
            continue;
        };
        let Some(PeriodCode::Month(month)) = parse_period_code(&obs.period) else {
            continue;
        };
        let Some(key) = PeriodKey::month(obs.year, month) else {
            continue;
        };

        if previous.is_some_and(|prev| key < prev) {
            out_of_order += 1;
        }
        previous = Some(key);

        let label = || month_label(obs, month);
        add(&mut buckets, key, label, value);
    }

    if out_of_order > 0 {
        warn!(?order, out_of_order, "observations did not arrive in the declared order");
    }

    finish(buckets)
}

fn month_label(obs: &Observation, month: u32) -> String {
    let name = obs
        .period_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MONTH_NAMES[(month - 1) as usize]);
    format!("{name} {}", obs.year)
}
