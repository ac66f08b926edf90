//! HTTP client construction
//!
//! One [`reqwest::Client`] is built per export and shared by every worker through
//! [`super::photo_http::PhotoHttpClient`], so connection pooling spans all
//! concurrent downloads.

use reqwest::Client;
use std::time::Duration;

use super::{FetcherError, FetcherResult};

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle pooled connections kept per host
const POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Build the HTTP client used for all service calls
///
/// Only the connect phase is bounded: payloads can be large and a whole-request
/// timeout would cut off slow but healthy transfers.
pub fn build_http_client() -> FetcherResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .user_agent(concat!("photo-export/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetcherError::ClientError(format!("failed to build HTTP client: {e}")))
}
