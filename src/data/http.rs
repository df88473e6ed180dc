//! Blocking HTTP transport used by the source adapters.
//!
//! Adapters talk to `HttpTransport` rather than `reqwest` directly so that
//! status classification and body parsing can be tested against scripted
//! responses.

use std::time::Duration;

use reqwest::blocking::Client;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx and 429 are worth another attempt; any other non-2xx is not.
    pub fn is_retryable_status(&self) -> bool {
        self.status >= 500 || self.status == 429
    }

    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.reason)
    }
}

/// Minimal request surface needed by the adapters.
///
/// An `Err` means no response was received (DNS, connect, timeout, read).
pub trait HttpTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, String>;
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, String>;
}

/// `reqwest` blocking client with a per-request timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { client })
    }

    fn finish(resp: reqwest::blocking::Response) -> Result<HttpResponse, String> {
        let status = resp.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = resp.text().map_err(|e| format!("failed to read response body: {e}"))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, String> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| format!("request failed: {e}"))?;
        Self::finish(resp)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, String> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| format!("request failed: {e}"))?;
        Self::finish(resp)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        assert!(response(500).is_retryable_status());
        assert!(response(503).is_retryable_status());
        assert!(response(429).is_retryable_status());
        assert!(!response(404).is_retryable_status());
        assert!(!response(400).is_retryable_status());
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(301).is_success());
    }

    mod reqwest_transport {
        use mockito::Matcher;
        use serde_json::json;

        use super::super::*;

        #[test]
        fn get_encodes_query_and_reads_body() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/fred/series/observations")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("series_id".into(), "UMCSENT".into()),
                    Matcher::UrlEncoded("api_key".into(), "a b&c".into()),
                    Matcher::UrlEncoded("observation_start".into(), "2024-01-01".into()),
                ]))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"observations":[]}"#)
                .create();

            let transport = ReqwestTransport::new().unwrap();
            let resp = transport
                .get(
                    &format!("{}/fred/series/observations", server.url()),
                    &[
                        ("series_id", "UMCSENT"),
                        ("api_key", "a b&c"),
                        ("observation_start", "2024-01-01"),
                    ],
                )
                .unwrap();

            mock.assert();
            assert_eq!(resp.status, 200);
            assert_eq!(resp.reason, "OK");
            assert_eq!(resp.body, r#"{"observations":[]}"#);
        }

        #[test]
        fn post_sends_json_and_keeps_error_status() {
            let mut server = mockito::Server::new();
            let payload = json!({ "seriesid": ["CUUR0000SA0"], "startyear": "2015" });
            let mock = server
                .mock("POST", "/timeseries/data/")
                .match_header("content-type", "application/json")
                .match_body(Matcher::Json(payload.clone()))
                .with_status(503)
                .with_body("maintenance")
                .create();

            let transport = ReqwestTransport::new().unwrap();
            let resp = transport
                .post_json(&format!("{}/timeseries/data/", server.url()), &payload)
                .unwrap();

            mock.assert();
            assert!(!resp.is_success());
            assert!(resp.is_retryable_status());
            assert_eq!(resp.status_line(), "503 Service Unavailable");
            assert_eq!(resp.body, "maintenance");
        }

        #[test]
        fn refused_connection_is_an_error() {
            let transport = ReqwestTransport::new().unwrap();
            let err = transport.get("http://127.0.0.1:1/", &[]).unwrap_err();
            assert!(err.starts_with("request failed"), "{err}");
        }
    }
}
