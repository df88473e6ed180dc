//! BLS public API (v2) integration.
//!
//! All series are requested in one batched POST. BLS answers `200` even for
//! rejected requests, so the top-level `status` field is checked separately
//! from the HTTP status.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::data::http::{HttpTransport, ReqwestTransport};
use crate::data::retry::{Attempt, Retry};
use crate::domain::{Observation, RawSeries, RawSeriesMap, SortOrder};
use crate::error::PipelineError;

pub const BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
const SOURCE: &str = "BLS";
const SUCCESS_STATUS: &str = "REQUEST_SUCCEEDED";

pub const SERIES_MEDIAN_WEEKLY_EARNINGS: &str = "LEU0252881500";
pub const SERIES_CPI_ALL_ITEMS: &str = "CUUR0000SA0";
pub const SERIES_CPI_SHELTER: &str = "CUUR0000SAH1";
pub const SERIES_CPI_FOOD_AT_HOME: &str = "CUUR0000SAF11";
pub const SERIES_CPI_ENERGY: &str = "CUUR0000SA0E";
pub const SERIES_CPI_TRANSPORTATION: &str = "CUUR0000SAT1";
pub const SERIES_CPI_MEDICAL_CARE: &str = "CUUR0000SAM";

/// Every series the BLS pipeline needs, in request order.
pub const ALL_SERIES: [&str; 7] = [
    SERIES_MEDIAN_WEEKLY_EARNINGS,
    SERIES_CPI_ALL_ITEMS,
    SERIES_CPI_SHELTER,
    SERIES_CPI_FOOD_AT_HOME,
    SERIES_CPI_ENERGY,
    SERIES_CPI_TRANSPORTATION,
    SERIES_CPI_MEDICAL_CARE,
];

/// BLS returns observations newest-first.
const RESPONSE_ORDER: SortOrder = SortOrder::NewestFirst;

/// File name of the raw response snapshot.
pub const SNAPSHOT_FILE: &str = "bls-response.json";

/// A successful BLS fetch: the parsed series plus the response exactly as received.
#[derive(Debug, Clone)]
pub struct BlsFetch {
    pub series: RawSeriesMap,
    pub raw: serde_json::Value,
}

pub struct BlsClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    retry: Retry,
    registration_key: Option<String>,
    endpoint: String,
}

impl BlsClient<ReqwestTransport> {
    /// Production client; a missing key degrades to unauthenticated requests.
    pub fn new(registration_key: Option<String>) -> Result<Self, PipelineError> {
        let transport = ReqwestTransport::new().map_err(|message| PipelineError::Transport {
            source_name: SOURCE,
            status: None,
            message,
            retries_exhausted: false,
        })?;
        Ok(Self::with_transport(transport, Retry::default(), registration_key))
    }
}

impl<T: HttpTransport> BlsClient<T> {
    pub fn with_transport(transport: T, retry: Retry, registration_key: Option<String>) -> Self {
        if registration_key.is_none() {
            warn!("BLS_API_KEY not set; using unauthenticated requests");
        }
        Self {
            transport,
            retry,
            registration_key,
            endpoint: BASE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch `series_ids` for the inclusive year range in one request.
    pub fn fetch_series(
        &self,
        series_ids: &[&str],
        start_year: i32,
        end_year: i32,
    ) -> Result<RawSeriesMap, PipelineError> {
        self.fetch(series_ids, start_year, end_year).map(|fetched| fetched.series)
    }

    /// Like [`fetch_series`](Self::fetch_series), keeping the raw response body.
    pub fn fetch(&self, series_ids: &[&str], start_year: i32, end_year: i32) -> Result<BlsFetch, PipelineError> {
        let mut body = json!({
            "seriesid": series_ids,
            "startyear": start_year.to_string(),
            "endyear": end_year.to_string(),
        });
        if let Some(key) = &self.registration_key {
            body["registrationkey"] = json!(key);
        }

        info!(series = series_ids.len(), start_year, end_year, "fetching BLS series");

        let (raw, response) = self.retry.run("BLS API fetch", |_| self.request(&body))?;

        let mut series_map = RawSeriesMap::new();
        for series in response.results.series {
            let observations = parse_points(&series.series_id, series.data);
            debug!(series_id = %series.series_id, points = observations.len(), "parsed BLS series");
            series_map.insert(
                series.series_id.clone(),
                RawSeries {
                    series_id: series.series_id,
                    order: RESPONSE_ORDER,
                    observations,
                },
            );
        }
        Ok(BlsFetch {
            series: series_map,
            raw,
        })
    }

    fn request(&self, body: &serde_json::Value) -> Result<(serde_json::Value, BlsResponse), Attempt<PipelineError>> {
        let resp = self.transport.post_json(&self.endpoint, body).map_err(|message| {
            Attempt::Retryable(PipelineError::Transport {
                source_name: SOURCE,
                status: None,
                message,
                retries_exhausted: false,
            })
        })?;

        if !resp.is_success() {
            let err = PipelineError::Transport {
                source_name: SOURCE,
                status: Some(resp.status),
                message: resp.status_line(),
                retries_exhausted: false,
            };
            return Err(if resp.is_retryable_status() {
                Attempt::Retryable(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        let shape_error = |e: serde_json::Error| {
            Attempt::Retryable(PipelineError::DataShape {
                context: "BLS response".to_string(),
                message: e.to_string(),
            })
        };
        let raw: serde_json::Value = serde_json::from_str(&resp.body).map_err(shape_error)?;
        let parsed = BlsResponse::deserialize(&raw).map_err(shape_error)?;

        if parsed.status != SUCCESS_STATUS {
            let message = if parsed.message.is_empty() {
                "Unknown error".to_string()
            } else {
                parsed.message.join(", ")
            };
            return Err(Attempt::Fatal(PipelineError::UpstreamBusiness {
                source_name: SOURCE,
                message,
            }));
        }

        Ok((raw, parsed))
    }
}

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results", default)]
    results: BlsResults,
}

#[derive(Debug, Default, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID")]
    series_id: String,
    /// Kept loose so one malformed point cannot reject the whole series.
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlsDataPoint {
    year: String,
    period: String,
    #[serde(default)]
    period_name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

fn parse_points(series_id: &str, data: Vec<serde_json::Value>) -> Vec<Observation> {
    let mut out = Vec::with_capacity(data.len());
    let mut skipped = 0usize;
    for raw in data {
        match serde_json::from_value::<BlsDataPoint>(raw) {
            Ok(point) => match point.year.trim().parse::<i32>() {
                Ok(year) => out.push(Observation {
                    year,
                    period: point.period,
                    period_name: point.period_name,
                    value: point.value,
                }),
                Err(_) => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(series_id, skipped, "skipped malformed BLS data points");
    }
    out
}
