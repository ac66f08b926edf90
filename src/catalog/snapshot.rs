//! Catalog snapshot persistence
//!
//! The snapshot is a JSON array of [`super::CatalogItem`]. It is written with an
//! atomic replace (temp file in the same directory, fsync, rename), so an
//! interrupted write never leaves a truncated array that would later parse as a
//! shorter catalog.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{Catalog, CatalogError, CatalogItem};

/// Location of the catalog snapshot file
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    path: PathBuf,
}

impl CatalogSnapshot {
    /// Snapshot stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a previously saved catalog
    ///
    /// Returns `None` when the file is absent, empty, or does not parse; the
    /// caller then enumerates again. Items without a content hash or remote id,
    /// which older snapshots may contain, are dropped.
    pub fn load(&self) -> Option<Catalog> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No catalog snapshot");
                return None;
            }
        };

        if contents.iter().all(u8::is_ascii_whitespace) {
            debug!(path = %self.path.display(), "Catalog snapshot is empty");
            return None;
        }

        match serde_json::from_slice::<Vec<CatalogItem>>(&contents) {
            Ok(mut items) => {
                let stored = items.len();
                items.retain(CatalogItem::is_exportable);
                if items.len() < stored {
                    debug!(
                        path = %self.path.display(),
                        dropped = stored - items.len(),
                        "Dropped snapshot items without a content hash or remote id"
                    );
                }

                let catalog = Catalog::new(items);
                info!(
                    path = %self.path.display(),
                    items = catalog.len(),
                    "Loaded catalog snapshot"
                );
                Some(catalog)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Catalog snapshot is unreadable, enumerating again"
                );
                None
            }
        }
    }

    /// Persist a catalog, atomically replacing any existing snapshot
    pub fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        debug!(path = %self.path.display(), items = catalog.len(), "Saving catalog snapshot");

        let parent_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir)
            .map_err(|e| CatalogError::Persist(format!("failed to create directory: {e}")))?;

        let json = serde_json::to_vec(catalog)
            .map_err(|e| CatalogError::Persist(format!("serialization failed: {e}")))?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CatalogError::Persist(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(&json)
            .map_err(|e| CatalogError::Persist(format!("failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| CatalogError::Persist(format!("failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| CatalogError::Persist(format!("failed to sync temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| CatalogError::Persist(format!("failed to persist temp file: {e}")))?;

        // Make the rename durable
        if let Ok(dir) = std::fs::File::open(parent_dir) {
            let _ = dir.sync_all();
        }

        info!(
            path = %self.path.display(),
            items = catalog.len(),
            "Catalog snapshot saved"
        );
        Ok(())
    }
}
