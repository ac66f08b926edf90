//! Library catalog: the ordered list of remote items to export
//!
//! The catalog is built once per export by [`CatalogBuilder`] and persisted as a
//! JSON snapshot by [`CatalogSnapshot`]. It is read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::fetcher::{FetcherError, ListEntry};

pub mod builder;
pub mod snapshot;

pub use builder::CatalogBuilder;
pub use snapshot::CatalogSnapshot;

/// One remote photo
///
/// Field names on disk match the snapshot format written by earlier exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    /// Content checksum, used as the dedup key in the ledger
    #[serde(rename = "md5")]
    pub content_hash: String,
    /// Remote identifier used to request the payload
    #[serde(rename = "fsid")]
    pub remote_id: String,
    /// Local output file name
    #[serde(rename = "filename")]
    pub file_name: String,
    /// Original creation time in Unix seconds; zero when unknown
    #[serde(rename = "ctime", default)]
    pub created_at: i64,
}

impl CatalogItem {
    /// Convert a listing entry, dropping entries that cannot be exported
    ///
    /// Entries without a content hash or remote id are skipped.
    pub fn from_entry(entry: ListEntry) -> Option<Self> {
        if entry.md5.is_empty() || entry.fsid.is_empty() {
            return None;
        }
        let file_name = entry.file_name().to_string();
        Some(Self {
            content_hash: entry.md5,
            remote_id: entry.fsid,
            file_name,
            created_at: entry.ctime,
        })
    }

    /// Whether the item has both a content hash and a remote id
    pub fn is_exportable(&self) -> bool {
        !self.content_hash.is_empty() && !self.remote_id.is_empty()
    }

    /// Original creation instant, if known
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        if self.created_at <= 0 {
            return None;
        }
        DateTime::<Utc>::from_timestamp(self.created_at, 0)
    }

    /// Original creation instant as [`SystemTime`], if known
    pub fn created_system_time(&self) -> Option<SystemTime> {
        self.created_time().map(SystemTime::from)
    }
}

/// Ordered item list in discovery order
///
/// Duplicate content hashes are kept; deduplication happens at download time
/// through the ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Wrap an item list
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Items in discovery order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<CatalogItem>> for Catalog {
    fn from(items: Vec<CatalogItem>) -> Self {
        Self::new(items)
    }
}

/// Catalog building errors
///
/// All of these are fatal for an export: a partial catalog is never returned.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Listing page could not be fetched or decoded
    #[error("listing failed: {0}")]
    Fetch(#[from] FetcherError),

    /// Snapshot could not be written
    #[error("failed to persist catalog snapshot: {0}")]
    Persist(String),

    /// Shutdown requested before enumeration finished
    #[error("catalog enumeration cancelled after {collected} items")]
    Cancelled {
        /// Items discovered before cancellation
        collected: usize,
    },
}
