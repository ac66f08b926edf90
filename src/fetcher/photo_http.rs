//! HTTP implementation of [`PhotoService`]
//!
//! Listing and authorization calls carry the session credential as a `Cookie`
//! header. The direct byte fetch goes to the signed `dlink` URL without it.
//! There is no retry here: a failed call is reported to the caller, and a failed
//! item is picked up again by the next run through the ledger.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::COOKIE;
use reqwest::{Client, Response};
use tracing::debug;

use crate::credential::Credential;
use crate::fetcher::client::build_http_client;
use crate::fetcher::response::{parse_download_link, parse_list_page};
use crate::fetcher::{ByteStream, FetcherError, FetcherResult, ListPage, PhotoService};

/// Production service endpoint
pub const DEFAULT_BASE_URL: &str = "https://photo.baidu.com";

/// Listing endpoint path
pub const LIST_ENDPOINT: &str = "/youai/file/v1/list";

/// Download authorization endpoint path
pub const DOWNLOAD_ENDPOINT: &str = "/youai/file/v2/download";

/// Client type tag expected by the service
const CLIENT_TYPE: &str = "70";

/// HTTP client for the photo service
pub struct PhotoHttpClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl PhotoHttpClient {
    /// Create a client against the production endpoint
    pub fn new(credential: Credential) -> FetcherResult<Self> {
        Self::with_base_url(credential, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by tests and mirrors)
    pub fn with_base_url(credential: Credential, base_url: impl Into<String>) -> FetcherResult<Self> {
        Ok(Self::from_parts(build_http_client()?, base_url, credential))
    }

    /// Assemble from an existing [`Client`]
    pub fn from_parts(client: Client, base_url: impl Into<String>, credential: Credential) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            credential,
        }
    }

    /// Base URL for service endpoints
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticated GET returning the raw body
    async fn get_authenticated(&self, endpoint: &str, params: &[(&str, &str)]) -> FetcherResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Making GET request to: {} with {} params", url, params.len());

        let response = self
            .client
            .get(&url)
            .query(params)
            .header(COOKIE, self.credential.expose())
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let response = check_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("failed to read body: {e}")))?;
        Ok(body.to_vec())
    }
}

/// Map non-2xx statuses to [`FetcherError::HttpError`]
async fn check_status(response: Response) -> FetcherResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(FetcherError::HttpError(format!("status {status}: {error_text}")))
}

#[async_trait]
impl PhotoService for PhotoHttpClient {
    async fn list_page(&self, cursor: &str) -> FetcherResult<ListPage> {
        let mut params = vec![("clienttype", CLIENT_TYPE), ("need_filter_hidden", "0")];
        if !cursor.is_empty() {
            params.push(("cursor", cursor));
        }

        let body = self.get_authenticated(LIST_ENDPOINT, &params).await?;
        parse_list_page(&body)
    }

    async fn download_link(&self, remote_id: &str) -> FetcherResult<String> {
        let params = [("clienttype", CLIENT_TYPE), ("fsid", remote_id)];
        let body = self.get_authenticated(DOWNLOAD_ENDPOINT, &params).await?;
        parse_download_link(&body)
    }

    async fn fetch_bytes(&self, url: &str) -> FetcherResult<ByteStream> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;
        let response = check_status(response).await?;

        let stream = response
            .bytes_stream()
            .map_err(|e| FetcherError::NetworkError(format!("payload read failed: {e}")));
        Ok(Box::pin(stream))
    }
}
