//! Remote photo service access
//!
//! [`PhotoService`] is the seam between the export pipeline and the network.
//! [`photo_http::PhotoHttpClient`] talks to the real service; tests substitute an
//! in-memory implementation returning canned pages.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

pub mod client;
pub mod pagination;
pub mod photo_http;
pub mod response;

pub use response::{ListEntry, ListPage};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-success HTTP status
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Transport failure (connect, TLS, body read)
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service answered with a non-zero application status
    #[error("API error: errno {errno}")]
    ApiError {
        /// Application status code reported by the service
        errno: i64,
    },

    /// Body was not the expected JSON shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Client construction failed
    #[error("client error: {0}")]
    ClientError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Stream of payload chunks from a direct download
pub type ByteStream = Pin<Box<dyn Stream<Item = FetcherResult<Bytes>> + Send>>;

/// Operations the export pipeline needs from the remote service
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Fetch one page of the library listing
    ///
    /// # Arguments
    /// * `cursor` - Resumption token from the previous page; empty for the first page
    ///
    /// # Returns
    /// The decoded page. A non-zero `errno` is reported as [`FetcherError::ApiError`].
    async fn list_page(&self, cursor: &str) -> FetcherResult<ListPage>;

    /// Request a short-lived direct download URL for one item
    ///
    /// # Arguments
    /// * `remote_id` - Identifier of the item (`fsid`)
    async fn download_link(&self, remote_id: &str) -> FetcherResult<String>;

    /// Fetch the binary payload behind a direct download URL
    async fn fetch_bytes(&self, url: &str) -> FetcherResult<ByteStream>;
}
