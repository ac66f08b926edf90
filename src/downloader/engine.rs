//! Download engine: bounded dispatch over a catalog with a join barrier
//!
//! The dispatcher walks the catalog in order. Items already in the ledger are
//! counted as skipped without taking a slot; every other item waits for an
//! admission permit and is then handed to its own task. Destinations are
//! settled during dispatch, so two items never share a path unless they share
//! a content hash. After dispatch the engine joins every task, so nothing is
//! still writing when it returns.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::admission::AdmissionGate;
use super::config::{clamp_concurrency, DEFAULT_CONCURRENCY};
use super::progress::ProgressState;
use super::summary::{DownloadSummary, ItemOutcome};
use super::DownloadError;
use crate::catalog::{Catalog, CatalogItem};
use crate::fetcher::PhotoService;
use crate::ledger::DownloadLedger;
use crate::metrics::{self, PhotoDownloadMetrics};
use crate::output::{self, default_restorer, DestinationPlanner, OutputResult, TimestampRestorer};
use crate::shutdown::SharedShutdown;

/// Concurrent exporter for a catalog
pub struct DownloadEngine {
    service: Arc<dyn PhotoService>,
    ledger: Arc<DownloadLedger>,
    output_dir: PathBuf,
    concurrency: usize,
    timestamps: Arc<dyn TimestampRestorer>,
    shutdown: Option<SharedShutdown>,
}

impl DownloadEngine {
    /// Create an engine writing into `output_dir`
    ///
    /// The directory must already exist.
    pub fn new(
        service: Arc<dyn PhotoService>,
        ledger: Arc<DownloadLedger>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service,
            ledger,
            output_dir: output_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            timestamps: default_restorer(),
            shutdown: None,
        }
    }

    /// Set the number of items transferred at once (clamped to the supported range)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = clamp_concurrency(concurrency);
        self
    }

    /// Replace the timestamp restorer
    pub fn with_timestamps(mut self, timestamps: Arc<dyn TimestampRestorer>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Configured concurrency limit
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Download every catalog item not yet in the ledger
    ///
    /// Per-item failures never abort the run. Returns after every dispatched
    /// item has reached a terminal state.
    pub async fn download_all(&self, catalog: &Catalog) -> DownloadSummary {
        let started = std::time::Instant::now();
        let gate = AdmissionGate::new(self.concurrency);
        let mut summary = DownloadSummary::new(catalog.len());
        let mut progress = ProgressState::new(catalog.len() as u64);
        let mut tasks: JoinSet<ItemOutcome> = JoinSet::new();
        let mut planner = DestinationPlanner::new(&self.output_dir);
        let mut visited = 0usize;

        info!(
            total = catalog.len(),
            concurrency = gate.capacity(),
            output_dir = %self.output_dir.display(),
            "Starting download"
        );

        for item in catalog.items() {
            if self.shutdown_requested() {
                break;
            }

            // Skipped items still claim their name
            let dest = planner.claim(&item.file_name, &item.content_hash);

            if self.ledger.is_downloaded(&item.content_hash) {
                debug!(content_hash = %item.content_hash, "Already downloaded, skipping");
                metrics::record_skipped();
                self.record(&mut summary, &mut progress, ItemOutcome::Skipped);
                visited += 1;
                continue;
            }

            let permit = match self.admit(&gate).await {
                Some(permit) => permit,
                None => break,
            };

            let worker = ItemWorker {
                service: self.service.clone(),
                ledger: self.ledger.clone(),
                timestamps: self.timestamps.clone(),
                shutdown: self.shutdown.clone(),
            };
            let item = item.clone();
            tasks.spawn(async move {
                let outcome = worker.run(&item, dest).await;
                drop(permit);
                outcome
            });
            visited += 1;

            while let Some(joined) = tasks.try_join_next() {
                self.reap(&mut summary, &mut progress, joined);
            }
        }

        let not_dispatched = catalog.len() - visited;
        if not_dispatched > 0 {
            info!(not_dispatched, "Shutdown requested - no further items dispatched");
            summary.cancelled += not_dispatched;
        }

        // Join barrier
        while let Some(joined) = tasks.join_next().await {
            self.reap(&mut summary, &mut progress, joined);
        }

        summary.elapsed = started.elapsed();
        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            bytes = summary.bytes_written,
            elapsed_secs = summary.elapsed.as_secs(),
            "Download finished"
        );
        summary
    }

    async fn admit(&self, gate: &AdmissionGate) -> Option<tokio::sync::OwnedSemaphorePermit> {
        let result = match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    permit = gate.admit() => permit,
                    _ = shutdown.wait_for_shutdown() => return None,
                }
            }
            None => gate.admit().await,
        };

        match result {
            Ok(permit) => Some(permit),
            Err(e) => {
                error!(error = %e, "Admission failed, stopping dispatch");
                None
            }
        }
    }

    fn reap(
        &self,
        summary: &mut DownloadSummary,
        progress: &mut ProgressState,
        joined: Result<ItemOutcome, tokio::task::JoinError>,
    ) {
        let outcome = joined.unwrap_or_else(|e| {
            error!(error = %e, "Download task panicked");
            ItemOutcome::Failed(DownloadError::Worker(e.to_string()))
        });
        self.record(summary, progress, outcome);
    }

    fn record(&self, summary: &mut DownloadSummary, progress: &mut ProgressState, outcome: ItemOutcome) {
        summary.record(&outcome);
        if matches!(outcome, ItemOutcome::Cancelled) {
            return;
        }
        if progress.advance() {
            info!("{}", progress.format_progress());
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }
}

/// Everything one spawned item needs
struct ItemWorker {
    service: Arc<dyn PhotoService>,
    ledger: Arc<DownloadLedger>,
    timestamps: Arc<dyn TimestampRestorer>,
    shutdown: Option<SharedShutdown>,
}

impl ItemWorker {
    async fn run(&self, item: &CatalogItem, dest: OutputResult<PathBuf>) -> ItemOutcome {
        let metrics = PhotoDownloadMetrics::start();

        let dest = match dest {
            Ok(dest) => dest,
            Err(e) => return self.fail(item, metrics, e.into()),
        };

        let transfer = self.transfer(item, &dest);
        let result = match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    result = transfer => result,
                    _ = shutdown.wait_for_shutdown() => {
                        // Dropping the transfer removes its temp file
                        debug!(content_hash = %item.content_hash, "Download abandoned for shutdown");
                        return ItemOutcome::Cancelled;
                    }
                }
            }
            None => transfer.await,
        };

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(item, metrics, e),
        };

        if let Some(created) = item.created_system_time() {
            if let Err(e) = self.timestamps.restore(&dest, created) {
                debug!(path = %dest.display(), error = %e, "Could not restore timestamp");
            }
        }

        if let Err(e) = self.ledger.mark_downloaded(&item.content_hash) {
            return self.fail(item, metrics, e.into());
        }

        metrics.record_success(bytes);
        ItemOutcome::Downloaded { bytes }
    }

    /// Authorize, then stream the payload to `dest`
    async fn transfer(&self, item: &CatalogItem, dest: &Path) -> Result<u64, DownloadError> {
        let link = self.service.download_link(&item.remote_id).await?;
        let stream = self.service.fetch_bytes(&link).await?;
        Ok(output::write_payload(dest, stream).await?)
    }

    fn fail(&self, item: &CatalogItem, metrics: PhotoDownloadMetrics, error: DownloadError) -> ItemOutcome {
        warn!(
            content_hash = %item.content_hash,
            remote_id = %item.remote_id,
            file_name = %item.file_name,
            error = %error,
            "Photo download failed"
        );
        metrics.record_failure(error.kind());
        ItemOutcome::Failed(error)
    }
}
