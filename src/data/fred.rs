//! FRED API integration.
//!
//! One GET per series. Observations come back oldest-first
//! (`sort_order=asc`); FRED marks missing observations with `"."`.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::data::http::{HttpTransport, ReqwestTransport};
use crate::data::retry::{Attempt, Retry};
use crate::domain::{Observation, RawSeries, RawSeriesMap, SortOrder};
use crate::error::PipelineError;

pub const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const SOURCE: &str = "FRED";
const MISSING_SENTINEL: &str = ".";

pub const SERIES_CONSUMER_SENTIMENT: &str = "UMCSENT";
pub const SERIES_SAHM_RULE: &str = "SAHMREALTIME";
pub const SERIES_HOUSEHOLD_DEBT_SERVICE: &str = "TDSP";

pub struct FredClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    retry: Retry,
    api_key: String,
    endpoint: String,
}

impl FredClient<ReqwestTransport> {
    pub fn new(api_key: String) -> Result<Self, PipelineError> {
        let transport = ReqwestTransport::new().map_err(|message| PipelineError::Transport {
            source_name: SOURCE,
            status: None,
            message,
            retries_exhausted: false,
        })?;
        Ok(Self::with_transport(transport, Retry::default(), api_key))
    }
}

impl<T: HttpTransport> FredClient<T> {
    pub fn with_transport(transport: T, retry: Retry, api_key: String) -> Self {
        Self {
            transport,
            retry,
            api_key,
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

    /// Fetch each series in `series_ids` over `[start, end]`.
    ///
    /// Stops at the first series that cannot be fetched.
    pub fn fetch_series(
        &self,
        series_ids: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeriesMap, PipelineError> {
        let mut out = RawSeriesMap::new();
        for &series_id in series_ids {
            let observations = self.fetch_one(series_id, start, end)?;
            out.insert(
                series_id.to_string(),
                RawSeries {
                    series_id: series_id.to_string(),
                    order: SortOrder::OldestFirst,
                    observations,
                },
            );
        }
        Ok(out)
    }

    fn fetch_one(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, PipelineError> {
        info!(series_id, %start, %end, "fetching FRED series");
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let label = format!("FRED API fetch ({series_id})");

        let body = self
            .retry
            .run(&label, |_| self.request(series_id, &start, &end))?;

        let observations = to_observations(series_id, body.observations);
        debug!(series_id, points = observations.len(), "parsed FRED series");
        Ok(observations)
    }

    fn request(&self, series_id: &str, start: &str, end: &str) -> Result<ObservationsResponse, Attempt<PipelineError>> {
        let query = [
            ("series_id", series_id),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("observation_start", start),
            ("observation_end", end),
            ("sort_order", "asc"),
        ];

        let resp = self.transport.get(&self.endpoint, &query).map_err(|message| {
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

        serde_json::from_str(&resp.body).map_err(|e| {
            Attempt::Retryable(PipelineError::DataShape {
                context: format!("FRED response for {series_id}"),
                message: e.to_string(),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    /// Kept loose so one malformed observation cannot reject the whole series.
    #[serde(default)]
    observations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    #[serde(default)]
    value: Option<String>,
}

/// Drop sentinel values and malformed observations; month codes mirror BLS (`M01`).
fn to_observations(series_id: &str, raw: Vec<serde_json::Value>) -> Vec<Observation> {
    let mut out = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for item in raw {
        let Ok(obs) = serde_json::from_value::<FredObservation>(item) else {
            skipped += 1;
            continue;
        };
        let Some(value) = obs.value else {
            skipped += 1;
            continue;
        };
        if value.trim() == MISSING_SENTINEL {
            continue;
        }
        let Ok(date) = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d") else {
            skipped += 1;
            continue;
        };
        out.push(Observation {
            year: date.year(),
            period: format!("M{:02}", date.month()),
            period_name: Some(date.format("%b").to_string()),
            value: Some(value),
        });
    }
    if skipped > 0 {
        warn!(series_id, skipped, "skipped malformed FRED observations");
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::json;

    /// FRED observations body for `(date, value)` pairs.
    pub fn fred_body(points: &[(&str, &str)]) -> String {
        let observations: Vec<_> = points
            .iter()
            .map(|(date, value)| {
                json!({
                    "realtime_start": "2025-01-01",
                    "realtime_end": "2025-01-01",
                    "date": date,
                    "value": value,
                })
            })
            .collect();
        json!({
            "units": "lin",
            "sort_order": "asc",
            "count": observations.len(),
            "observations": observations,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::fred_body;
    use super::*;
    use crate::data::http::testing::ScriptedTransport;
    use crate::data::retry::testing::instant_retry;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(transport: ScriptedTransport) -> FredClient<ScriptedTransport> {
        FredClient::with_transport(transport, instant_retry(), "key123".to_string())
    }

    #[test]
    fn sends_range_and_sort_order() {
        let fred = client(ScriptedTransport::new().respond(200, fred_body(&[("2024-01-01", "79.0")])));

        fred.fetch_series(&[SERIES_CONSUMER_SENTIMENT], date(2015, 1, 1), date(2025, 1, 1))
            .unwrap();

        let requests = fred.transport().requests.borrow();
        assert_eq!(requests[0].method, "GET");
        let query = &requests[0].query;
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("series_id"), Some("UMCSENT"));
        assert_eq!(get("api_key"), Some("key123"));
        assert_eq!(get("file_type"), Some("json"));
        assert_eq!(get("observation_start"), Some("2015-01-01"));
        assert_eq!(get("observation_end"), Some("2025-01-01"));
        assert_eq!(get("sort_order"), Some("asc"));
    }

    #[test]
    fn drops_missing_value_sentinel() {
        let body = fred_body(&[("2024-01-01", "79.0"), ("2024-02-01", "."), ("2024-03-01", "79.4")]);
        let fred = client(ScriptedTransport::new().respond(200, body));

        let map = fred
            .fetch_series(&[SERIES_CONSUMER_SENTIMENT], date(2024, 1, 1), date(2024, 3, 31))
            .unwrap();

        let series = &map[SERIES_CONSUMER_SENTIMENT];
        assert_eq!(series.order, SortOrder::OldestFirst);
        let periods: Vec<_> = series.observations.iter().map(|o| o.period.as_str()).collect();
        assert_eq!(periods, vec!["M01", "M03"]);
        assert_eq!(series.observations[1].period_name.as_deref(), Some("Mar"));
    }

    #[test]
    fn malformed_observations_are_dropped_individually() {
        let body = json!({
            "observations": [
                { "date": "2024-01-01", "value": "79.0" },
                { "date": "2024-02-01", "value": null },
                { "value": "77.5" },
                { "date": "not-a-date", "value": "78.1" },
                { "date": "2024-03-01", "value": "79.4" },
            ]
        })
        .to_string();
        let fred = client(ScriptedTransport::new().respond(200, body));

        let map = fred
            .fetch_series(&[SERIES_CONSUMER_SENTIMENT], date(2024, 1, 1), date(2024, 3, 31))
            .unwrap();

        let values: Vec<_> = map[SERIES_CONSUMER_SENTIMENT]
            .observations
            .iter()
            .map(|o| o.value.as_deref().unwrap())
            .collect();
        assert_eq!(values, vec!["79.0", "79.4"]);
        assert_eq!(fred.transport().request_count(), 1);
    }

    #[test]
    fn one_request_per_series() {
        let transport = ScriptedTransport::new()
            .respond(200, fred_body(&[("2024-01-01", "0.37")]))
            .respond(200, fred_body(&[("2024-01-01", "11.3")]));
        let fred = client(transport);

        let map = fred
            .fetch_series(
                &[SERIES_SAHM_RULE, SERIES_HOUSEHOLD_DEBT_SERVICE],
                date(2024, 1, 1),
                date(2024, 12, 31),
            )
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(fred.transport().request_count(), 2);
    }

    #[test]
    fn bad_request_is_not_retried() {
        let fred = client(ScriptedTransport::new().respond(400, "{\"error_message\":\"bad key\"}"));
        let err = fred
            .fetch_series(&[SERIES_SAHM_RULE], date(2024, 1, 1), date(2024, 12, 31))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(fred.transport().request_count(), 1);
    }

    #[test]
    fn network_failures_are_retried() {
        let transport = ScriptedTransport::new()
            .fail("connection reset")
            .respond(200, fred_body(&[("2024-01-01", "0.37")]));
        let fred = client(transport);

        let map = fred
            .fetch_series(&[SERIES_SAHM_RULE], date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();

        assert_eq!(map[SERIES_SAHM_RULE].observations.len(), 1);
        assert_eq!(fred.transport().request_count(), 2);
    }

    #[test]
    fn round_trip_over_http() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/fred/series/observations")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("series_id".into(), "TDSP".into()),
                mockito::Matcher::UrlEncoded("api_key".into(), "key123".into()),
                mockito::Matcher::UrlEncoded("sort_order".into(), "asc".into()),
            ]))
            .with_status(200)
            .with_body(fred_body(&[("2024-04-01", "11.3"), ("2024-07-01", ".")]))
            .create();
        let fred = FredClient::new("key123".to_string())
            .unwrap()
            .with_endpoint(format!("{}/fred/series/observations", server.url()));

        let map = fred
            .fetch_series(&[SERIES_HOUSEHOLD_DEBT_SERVICE], date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();

        mock.assert();
        let obs = &map[SERIES_HOUSEHOLD_DEBT_SERVICE].observations;
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].period, "M04");
    }
}
