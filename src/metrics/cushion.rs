use crate::data::shed::ShedYear;
use crate::domain::{CushionPoint, FinancialCushion};
use crate::error::PipelineError;

/// Latest survey year's headline figures plus the full `$400` history.
pub fn financial_cushion(history: &[ShedYear], last_updated: &str) -> Result<FinancialCushion, PipelineError> {
    let latest = history
        .iter()
        .max_by_key(|row| row.year)
        .ok_or_else(|| PipelineError::InsufficientData {
            metric: "financial cushion",
            reason: "no survey years".to_string(),
        })?;

    let mut data: Vec<CushionPoint> = history
        .iter()
        .map(|row| CushionPoint {
            year: row.year,
            can_cover_400: row.can_cover_400,
        })
        .collect();
    data.sort_by_key(|p| p.year);

    Ok(FinancialCushion {
        can_cover_400: latest.can_cover_400,
        cannot_cover_400: latest.cannot_cover_400,
        has_3_month_savings: latest.has_3_month_savings,
        year: latest.year,
        data,
        last_updated: last_updated.to_string(),
        is_fallback: false,
    })
}
