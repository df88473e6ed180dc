//! Upstream data sources.
//!
//! - `http`: blocking transport seam
//! - `retry`: bounded exponential backoff shared by every network call
//! - `bls` / `fred`: source adapters producing raw series keyed by id
//! - `shed`: curated annual survey figures

pub mod bls;
pub mod fred;
pub mod http;
pub mod retry;
pub mod shed;

pub use bls::{BlsClient, BlsFetch};
pub use fred::FredClient;
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use retry::{Attempt, Retry, RetryError, RetryPolicy, Sleeper, ThreadSleeper};
