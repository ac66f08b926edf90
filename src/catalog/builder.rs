//! Catalog enumeration
//!
//! Turns the cursor-driven listing API into a complete catalog. Enumeration has
//! no partial-success mode: any page failure aborts the build before the
//! snapshot is touched.

use std::sync::Arc;
use tracing::info;

use super::{Catalog, CatalogError, CatalogItem, CatalogSnapshot};
use crate::fetcher::pagination::{PaginationHelper, PaginationOutcome};
use crate::fetcher::PhotoService;
use crate::metrics;
use crate::shutdown::SharedShutdown;

/// Builds (or reloads) the catalog for an export
pub struct CatalogBuilder {
    service: Arc<dyn PhotoService>,
    snapshot: CatalogSnapshot,
    refresh: bool,
    shutdown: Option<SharedShutdown>,
}

impl CatalogBuilder {
    /// Create a builder that reuses `snapshot` when it is valid
    pub fn new(service: Arc<dyn PhotoService>, snapshot: CatalogSnapshot) -> Self {
        Self {
            service,
            snapshot,
            refresh: false,
            shutdown: None,
        }
    }

    /// Ignore an existing snapshot and enumerate again
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Attach a shared shutdown handle, checked between pages and during page requests
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Return the catalog, enumerating the remote library if needed
    ///
    /// A valid snapshot short-circuits enumeration entirely. Otherwise every page
    /// is fetched, entries without a content hash are dropped, and the complete
    /// catalog is written to the snapshot exactly once before being returned.
    pub async fn build(&self) -> Result<Catalog, CatalogError> {
        if !self.refresh {
            if let Some(catalog) = self.snapshot.load() {
                info!(items = catalog.len(), "Using existing catalog snapshot");
                return Ok(catalog);
            }
        }

        info!("Enumerating remote library");
        let service = self.service.clone();
        let outcome = PaginationHelper::paginate_cursor(
            move |cursor: String| {
                let service = service.clone();
                async move { service.list_page(&cursor).await }
            },
            CatalogItem::from_entry,
            |page, discovered, has_more| {
                metrics::record_catalog_page();
                if has_more {
                    info!(page, discovered, "Discovered {discovered} photos, more pages to fetch");
                } else {
                    info!(page, discovered, "Discovered {discovered} photos, listing complete");
                }
            },
            self.shutdown.as_ref(),
        )
        .await?;

        let catalog = match outcome {
            PaginationOutcome::Complete(items) => Catalog::new(items),
            PaginationOutcome::Cancelled { collected } => {
                return Err(CatalogError::Cancelled { collected });
            }
        };

        metrics::record_catalog_items(catalog.len());
        self.snapshot.save(&catalog)?;
        Ok(catalog)
    }
}
