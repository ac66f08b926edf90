//! Export command implementation

use crate::catalog::{CatalogBuilder, CatalogSnapshot};
use crate::credential::Credential;
use crate::downloader::config::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
use crate::downloader::{DownloadEngine, DownloadSummary};
use crate::fetcher::photo_http::{PhotoHttpClient, DEFAULT_BASE_URL};
use crate::fetcher::PhotoService;
use crate::ledger::{DownloadLedger, LedgerLock};
use crate::shutdown::SharedShutdown;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::CliError;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Export a remote photo library into a local directory, resuming where the
/// previous run stopped
#[derive(Parser, Debug)]
#[command(name = "photo-export", version, about, long_about = None)]
pub struct Cli {
    /// Base directory for the credential, catalog, ledger and output paths
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,

    /// File holding the session cookie header value
    #[arg(long, default_value = "cookie.txt")]
    pub credential_file: PathBuf,

    /// Catalog snapshot written after the first full enumeration
    #[arg(long, default_value = "imageList.json")]
    pub catalog_file: PathBuf,

    /// Ledger of content hashes already downloaded
    #[arg(long, default_value = "download.txt")]
    pub ledger_file: PathBuf,

    /// Directory the photos are written to
    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,

    /// Number of photos downloaded at once (max: 32)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Ignore an existing catalog snapshot and enumerate the library again
    #[arg(long, default_value_t = false)]
    pub refresh_catalog: bool,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Service base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,
}

/// Files and directories used by one export, resolved against the work dir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// Credential file
    pub credential: PathBuf,
    /// Catalog snapshot
    pub catalog: PathBuf,
    /// Ledger log
    pub ledger: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Cli {
    /// Resolve every relative path against `--work-dir`
    pub fn paths(&self) -> ExportPaths {
        let resolve = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.work_dir.join(path)
            }
        };

        ExportPaths {
            credential: resolve(&self.credential_file),
            catalog: resolve(&self.catalog_file),
            ledger: resolve(&self.ledger_file),
            output_dir: resolve(&self.output_dir),
        }
    }

    /// Run the export
    ///
    /// Credential, ledger, catalog and output directory problems are fatal and
    /// returned as errors. Per-photo failures are only counted in the summary.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<DownloadSummary, CliError> {
        let paths = self.paths();

        let credential = Credential::load(&paths.credential)?;

        let _lock = LedgerLock::try_acquire(&paths.ledger)?;
        let ledger = Arc::new(DownloadLedger::open(&paths.ledger)?);

        let service: Arc<dyn PhotoService> =
            Arc::new(PhotoHttpClient::with_base_url(credential, self.base_url.as_str())?);

        let catalog = CatalogBuilder::new(service.clone(), CatalogSnapshot::new(&paths.catalog))
            .with_refresh(self.refresh_catalog)
            .with_shutdown(shutdown.clone())
            .build()
            .await?;
        info!(items = catalog.len(), "Catalog ready");

        std::fs::create_dir_all(&paths.output_dir).map_err(|e| {
            CliError::OutputError(format!(
                "Failed to create output directory {}: {e}",
                paths.output_dir.display()
            ))
        })?;

        let summary = DownloadEngine::new(service, ledger, &paths.output_dir)
            .with_concurrency(self.concurrency)
            .with_shutdown(shutdown)
            .download_all(&catalog)
            .await;

        Ok(summary)
    }
}
