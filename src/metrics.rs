//! Export observability metrics
//!
//! Counters for enumeration and per-photo outcomes, a download duration
//! histogram and an in-flight gauge. Everything here is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<RwLock<bool>> = Lazy::new(|| RwLock::new(false));

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed (address in use, recorder already set)
    #[error("failed to install Prometheus exporter: {0}")]
    InstallError(String),
}

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: a second call is a no-op.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint (e.g. "127.0.0.1:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::InstallError(e.to_string()))?;

    describe_counter!(
        "catalog_pages_total",
        Unit::Count,
        "Listing pages fetched while enumerating the library"
    );
    describe_counter!(
        "catalog_items_total",
        Unit::Count,
        "Photos recorded in freshly enumerated catalogs"
    );
    describe_counter!(
        "photos_downloaded_total",
        Unit::Count,
        "Photos written to the output directory"
    );
    describe_counter!(
        "photos_skipped_total",
        Unit::Count,
        "Photos skipped because the ledger already records them"
    );
    describe_counter!(
        "photos_failed_total",
        Unit::Count,
        "Photos whose download failed"
    );
    describe_histogram!(
        "photo_download_duration_seconds",
        Unit::Seconds,
        "Time from admission to ledger mark for one photo"
    );
    describe_gauge!(
        "photo_downloads_in_flight",
        Unit::Count,
        "Downloads currently holding an admission permit"
    );

    *initialized = true;
    info!(%addr, "Metrics endpoint listening");
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// One listing page was fetched
pub fn record_catalog_page() {
    counter!("catalog_pages_total").increment(1);
}

/// A fresh catalog of `items` photos was built
pub fn record_catalog_items(items: usize) {
    counter!("catalog_items_total").increment(items as u64);
}

/// A photo was skipped because it is already in the ledger
pub fn record_skipped() {
    counter!("photos_skipped_total").increment(1);
}

/// Per-photo download timing and outcome
pub struct PhotoDownloadMetrics {
    start_time: Instant,
}

impl PhotoDownloadMetrics {
    /// Start timing a photo that has been admitted
    pub fn start() -> Self {
        gauge!("photo_downloads_in_flight").increment(1.0);
        Self {
            start_time: Instant::now(),
        }
    }

    /// Record a completed download
    pub fn record_success(self, bytes: u64) {
        let duration = self.start_time.elapsed();
        counter!("photos_downloaded_total").increment(1);
        histogram!("photo_download_duration_seconds").record(duration.as_secs_f64());
        debug!(
            bytes = bytes,
            duration_ms = duration.as_millis(),
            "Photo download recorded"
        );
    }

    /// Record a failed download, labelled with a short failure kind
    pub fn record_failure(self, kind: &'static str) {
        counter!("photos_failed_total", "kind" => kind).increment(1);
    }
}

impl Drop for PhotoDownloadMetrics {
    fn drop(&mut self) {
        gauge!("photo_downloads_in_flight").decrement(1.0);
    }
}
