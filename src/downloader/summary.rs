//! Per-item outcomes and the run summary

use std::fmt;
use std::time::Duration;

use super::DownloadError;

/// Terminal outcome of one catalog item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Written, timestamped and recorded in the ledger
    Downloaded {
        /// Payload size
        bytes: u64,
    },
    /// Already recorded in the ledger
    Skipped,
    /// Failed; the item stays unrecorded and is retried on the next run
    Failed(DownloadError),
    /// Abandoned because shutdown was requested
    Cancelled,
}

/// Counts for one engine run
///
/// Every catalog item ends up in exactly one bucket, so the buckets sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Catalog size
    pub total: usize,
    /// Newly downloaded this run
    pub downloaded: usize,
    /// Already in the ledger
    pub skipped: usize,
    /// Failed this run
    pub failed: usize,
    /// Not attempted or abandoned due to shutdown
    pub cancelled: usize,
    /// Payload bytes written this run
    pub bytes_written: u64,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Empty summary for a catalog of `total` items
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one item outcome
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes_written += bytes;
            }
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
            ItemOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Whether the run covered the whole catalog without shutdown
    pub fn is_complete(&self) -> bool {
        self.cancelled == 0
    }

    /// Whether every item is now present locally
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} photos: {} downloaded, {} skipped, {} failed",
            self.total, self.downloaded, self.skipped, self.failed
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        write!(f, " ({:.1}s)", self.elapsed.as_secs_f64())
    }
}
