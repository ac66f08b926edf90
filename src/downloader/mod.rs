//! Bounded concurrent photo downloads
//!
//! The engine walks a [`crate::Catalog`] and, for every item not yet in the
//! [`crate::ledger::DownloadLedger`], authorizes the download, streams the bytes
//! into the output directory, restores the original timestamp and records the
//! content hash.
//!
//! # Overview
//!
//! 1. **Admission**: at most `concurrency` items are in flight, via [`admission::AdmissionGate`]
//! 2. **Isolation**: a failing item is logged and counted, the rest continue
//! 3. **Join barrier**: [`engine::DownloadEngine::download_all`] returns only after every
//!    dispatched item has finished
//! 4. **Resume**: the ledger makes a rerun skip everything already downloaded
//!
//! # Quick Start
//!
//! ```no_run
//! use photo_export::downloader::DownloadEngine;
//! use photo_export::fetcher::photo_http::PhotoHttpClient;
//! use photo_export::ledger::DownloadLedger;
//! use photo_export::{Catalog, Credential};
//! use std::sync::Arc;
//!
//! # async fn example(catalog: Catalog) -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(PhotoHttpClient::new(Credential::load("cookie.txt".as_ref())?)?);
//! let ledger = Arc::new(DownloadLedger::open("download.txt")?);
//!
//! let summary = DownloadEngine::new(service, ledger, "images")
//!     .with_concurrency(4)
//!     .download_all(&catalog)
//!     .await;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`engine`] - Dispatcher and per-item worker
//! - [`admission`] - Semaphore-backed admission gate
//! - [`summary`] - Item outcomes and run counts
//! - [`progress`] - Progress milestones
//! - [`config`] - Concurrency limits

pub mod admission;
pub mod config;
pub mod engine;
pub mod progress;
pub mod summary;

pub use admission::{AdmissionError, AdmissionGate};
pub use engine::DownloadEngine;
pub use summary::{DownloadSummary, ItemOutcome};

use crate::fetcher::FetcherError;
use crate::ledger::LedgerError;
use crate::output::OutputError;

/// Per-item download errors
///
/// None of these stop the run; they are counted in the summary.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Authorization or payload request failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetcherError),

    /// Payload stream broke mid-transfer
    #[error("transfer interrupted: {0}")]
    Transfer(String),

    /// Local write failed
    #[error("IO error: {0}")]
    Io(String),

    /// Remote file name cannot be used locally
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Content hash could not be recorded
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Worker task ended abnormally
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl DownloadError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Transfer(_) => "transfer",
            Self::Io(_) => "io",
            Self::InvalidFileName(_) => "invalid_file_name",
            Self::Ledger(_) => "ledger",
            Self::Worker(_) => "worker",
        }
    }
}

impl From<OutputError> for DownloadError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::InvalidFileName(name) => Self::InvalidFileName(name),
            OutputError::StreamError(msg) => Self::Transfer(msg),
            OutputError::IoError(msg) => Self::Io(msg),
        }
    }
}
