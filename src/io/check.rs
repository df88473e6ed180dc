//! Health check over persisted metric files.
//!
//! A file must exist, match its schema and carry a parseable `lastUpdated`.
//! Age beyond the metric's limit is reported but does not fail the check.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::MetricId;
use crate::io::store::MetricStore;
use crate::validate::schema_for;

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Fresh { age_days: f64 },
    Stale { age_days: f64, max_age_days: i64 },
    Missing,
    Invalid { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileCheck {
    pub metric: MetricId,
    pub status: FileStatus,
}

impl FileCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, FileStatus::Fresh { .. } | FileStatus::Stale { .. })
    }
}

fn invalid(reason: impl Into<String>) -> FileStatus {
    FileStatus::Invalid { reason: reason.into() }
}

pub fn check_metric(store: &MetricStore, metric: MetricId, now: DateTime<Utc>) -> FileCheck {
    let status = if !store.exists(metric) {
        FileStatus::Missing
    } else {
        match store.read(metric) {
            Err(err) => invalid(err.to_string()),
            Ok(value) => match schema_for(metric).validate(&value) {
                Err(err) => invalid(err.issues.join("; ")),
                Ok(()) => {
                    let stamp = value["lastUpdated"].as_str().unwrap_or_default();
                    match DateTime::parse_from_rfc3339(stamp) {
                        Err(e) => invalid(format!("lastUpdated: {e}")),
                        Ok(updated) => {
                            let age = now.signed_duration_since(updated.with_timezone(&Utc));
                            let age_days = age.num_seconds() as f64 / 86_400.0;
                            let max_age_days = metric.max_age_days();
                            if age_days > max_age_days as f64 {
                                FileStatus::Stale { age_days, max_age_days }
                            } else {
                                FileStatus::Fresh { age_days }
                            }
                        }
                    }
                }
            },
        }
    };
    FileCheck { metric, status }
}

/// Check every metric file and log one line per metric.
pub fn check_all(store: &MetricStore, now: DateTime<Utc>) -> Vec<FileCheck> {
    MetricId::ALL
        .iter()
        .map(|&metric| {
            let check = check_metric(store, metric, now);
            match &check.status {
                FileStatus::Fresh { age_days } => {
                    info!(%metric, age_days = age_days.round(), "metric file valid");
                }
                FileStatus::Stale { age_days, max_age_days } => {
                    warn!(%metric, age_days = age_days.round(), max_age_days, "metric file is stale");
                }
                FileStatus::Missing => {
                    error!(%metric, path = %store.path(metric).display(), "metric file not found");
                }
                FileStatus::Invalid { reason } => {
                    error!(%metric, %reason, "metric file invalid");
                }
            }
            check
        })
        .collect()
}
