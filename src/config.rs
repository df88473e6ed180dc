//! Process configuration, read once from the environment.

use std::path::PathBuf;

use tracing::warn;

use crate::error::PipelineError;

pub const DEFAULT_METRICS_DIR: &str = "src/data/metrics";
pub const DEFAULT_RAW_DIR: &str = "src/data/raw";
pub const DEFAULT_HISTORY_YEARS: u32 = 10;
/// The widest year range one BLS v2 request accepts with a registered key.
pub const MAX_HISTORY_YEARS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bls_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub metrics_dir: PathBuf,
    /// Where raw upstream responses are snapshotted.
    pub raw_dir: PathBuf,
    /// How far back each fetch reaches, in `1..=MAX_HISTORY_YEARS`.
    pub history_years: u32,
}

impl Config {
    /// Load `.env.local` and `.env` (both optional), then read the process
    /// environment. Variables already set win over either file.
    pub fn from_env() -> Self {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let history_years = match non_empty("HISTORY_YEARS") {
            None => DEFAULT_HISTORY_YEARS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(years) if (1..=MAX_HISTORY_YEARS).contains(&years) => years,
                Ok(years) if years > MAX_HISTORY_YEARS => {
                    warn!(value = years, max = MAX_HISTORY_YEARS, "HISTORY_YEARS too large; clamping");
                    MAX_HISTORY_YEARS
                }
                _ => {
                    warn!(value = %raw, default = DEFAULT_HISTORY_YEARS, "ignoring invalid HISTORY_YEARS");
                    DEFAULT_HISTORY_YEARS
                }
            },
        };

        Self {
            bls_api_key: non_empty("BLS_API_KEY"),
            fred_api_key: non_empty("FRED_API_KEY"),
            metrics_dir: non_empty("METRICS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METRICS_DIR)),
            raw_dir: non_empty("RAW_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_DIR)),
            history_years,
        }
    }

    /// The FRED key, or a configuration error naming where to get one.
    pub fn require_fred_key(&self) -> Result<&str, PipelineError> {
        self.fred_api_key.as_deref().ok_or_else(|| {
            PipelineError::Configuration(
                "FRED_API_KEY environment variable is required \
                 (get a free key at https://fred.stlouisfed.org/docs/api/api_key.html)"
                    .to_string(),
            )
        })
    }
}
