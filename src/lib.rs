//! # Photo Export Library
//!
//! Bulk-exports a remote photo library through its authenticated HTTP API and
//! keeps enough local state to resume an interrupted export without fetching
//! anything twice.
//!
//! ## Pipeline
//!
//! 1. [`catalog::CatalogBuilder`] walks the cursor-paginated listing endpoint and
//!    persists the complete [`catalog::Catalog`] as a JSON snapshot. Later runs
//!    load the snapshot instead of enumerating again.
//! 2. [`downloader::DownloadEngine`] runs a bounded pool of concurrent workers over
//!    the catalog. Each worker resolves a short-lived download link, streams the
//!    payload to disk and records the item's content hash in the
//!    [`ledger::DownloadLedger`].
//! 3. The ledger is an append-only log of content hashes. Items already in it are
//!    skipped, so re-running the export is the retry mechanism for failed items.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use photo_export::catalog::{CatalogBuilder, CatalogSnapshot};
//! use photo_export::downloader::DownloadEngine;
//! use photo_export::fetcher::photo_http::PhotoHttpClient;
//! use photo_export::ledger::DownloadLedger;
//! use photo_export::Credential;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credential = Credential::load("cookie.txt".as_ref())?;
//! let service = Arc::new(PhotoHttpClient::new(credential)?);
//!
//! let snapshot = CatalogSnapshot::new("imageList.json");
//! let catalog = CatalogBuilder::new(service.clone(), snapshot).build().await?;
//!
//! let ledger = Arc::new(DownloadLedger::open("download.txt")?);
//! let engine = DownloadEngine::new(service, ledger, "images");
//! let summary = engine.download_all(&catalog).await;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Listing enumeration and catalog snapshots
pub mod catalog;

/// CLI command implementations
pub mod cli;

/// Credential file handling
pub mod credential;

/// Concurrent download engine
pub mod downloader;

/// Remote photo service client
pub mod fetcher;

/// Durable record of completed downloads
pub mod ledger;

/// Metrics collection
pub mod metrics;

/// Payload persistence on the local filesystem
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

pub use catalog::{Catalog, CatalogItem};
pub use credential::Credential;
