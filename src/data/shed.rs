//! Federal Reserve SHED (Survey of Household Economics and Decisionmaking).
//!
//! SHED is published once a year as a report rather than through an API, so
//! the headline figures are curated here by hand after each release.

/// Headline emergency-savings figures for one survey year (percent of adults).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShedYear {
    pub year: i32,
    pub can_cover_400: f64,
    pub cannot_cover_400: f64,
    pub has_3_month_savings: f64,
}

const fn row(year: i32, can_cover_400: f64, cannot_cover_400: f64, has_3_month_savings: f64) -> ShedYear {
    ShedYear {
        year,
        can_cover_400,
        cannot_cover_400,
        has_3_month_savings,
    }
}

/// Oldest first.
pub const SHED_HISTORY: [ShedYear; 6] = [
    row(2019, 61.0, 12.0, 52.0),
    row(2020, 64.0, 14.0, 54.0),
    row(2021, 68.0, 11.0, 58.0),
    row(2022, 63.0, 13.0, 54.0),
    row(2023, 63.0, 13.0, 54.0),
    row(2024, 63.0, 13.0, 55.0),
];
