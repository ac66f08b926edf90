//! Cross-process exclusion for the ledger log
//!
//! Workers inside one process are serialized by the ledger's mutex. This advisory
//! lock (fd-lock) keeps a second exporter process from appending to the same log.

use super::LedgerError;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock held for the duration of an export
///
/// The OS lock is released when the lock file handle closes, i.e. on drop.
pub struct LedgerLock {
    #[allow(dead_code)]
    lock: RwLock<File>,
    path: PathBuf,
}

impl LedgerLock {
    /// Try to take the lock for the ledger at `ledger_path`, without blocking
    ///
    /// The lock file sits next to the ledger as `<ledger file name>.lock`.
    pub fn try_acquire(ledger_path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = ledger_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LedgerError::IoError(e.to_string()))?;
            }
        }

        let lock_path = lock_path(ledger_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LedgerError::LockError(format!("Failed to open lock file: {e}")))?;

        let mut lock = RwLock::new(file);
        let guard = lock.try_write().map_err(|e| {
            LedgerError::LockError(format!(
                "{} is in use by another export ({e})",
                ledger_path.display()
            ))
        })?;
        // Keep the OS lock until the file handle is closed
        std::mem::forget(guard);

        Ok(Self {
            lock,
            path: lock_path,
        })
    }

    /// Lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(ledger_path: &Path) -> PathBuf {
    let mut name = ledger_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    ledger_path.with_file_name(name)
}
