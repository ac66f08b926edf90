//! Download ledger: durable record of completed content hashes
//!
//! The on-disk form is a flat comma-terminated list (`hash,hash,`), appended to
//! once per completed download and read back in full at startup. Membership is
//! monotonic: a key is never removed.
//!
//! The in-memory set and the append handle sit behind one mutex, so a mark is a
//! single unit with respect to other markers and records never interleave.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub mod lock;

pub use lock::LedgerLock;

/// Record terminator in the ledger log
const RECORD_SEPARATOR: char = ',';

struct LedgerState {
    keys: HashSet<String>,
    log: File,
}

/// Durable set of content hashes that have been downloaded
pub struct DownloadLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

impl DownloadLedger {
    /// Open (or create) the ledger log at `path` and load every recorded key
    ///
    /// Unreadable contents are tolerated: the ledger then starts empty and the
    /// export simply re-downloads. A trailing record without its terminator (a
    /// torn write) is truncated away before new appends.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LedgerError::IoError(e.to_string()))?;
            }
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LedgerError::IoError(format!("failed to open ledger log: {e}")))?;

        let raw = std::fs::read(&path)
            .map_err(|e| LedgerError::IoError(format!("failed to read ledger log: {e}")))?;

        let keys = match String::from_utf8(raw) {
            Ok(contents) => {
                let (keys, valid_len) = parse_records(&contents);
                if valid_len < contents.len() {
                    debug!(path = %path.display(), "Dropping partial trailing ledger record");
                    log.set_len(valid_len as u64)
                        .map_err(|e| LedgerError::IoError(format!("failed to repair ledger log: {e}")))?;
                }
                keys
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger log is not valid text, starting with an empty ledger"
                );
                // Terminate whatever is there so new records stay separate
                log.write_all(&[RECORD_SEPARATOR as u8])
                    .and_then(|_| log.flush())
                    .map_err(|e| LedgerError::IoError(format!("failed to repair ledger log: {e}")))?;
                HashSet::new()
            }
        };

        info!(
            path = %path.display(),
            entries = keys.len(),
            "Download ledger loaded"
        );

        Ok(Self {
            path,
            state: Mutex::new(LedgerState { keys, log }),
        })
    }

    /// Ledger log path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `content_hash` has already been downloaded
    pub fn is_downloaded(&self, content_hash: &str) -> bool {
        self.lock_state().keys.contains(content_hash)
    }

    /// Record `content_hash` as downloaded
    ///
    /// Appends one record and updates membership under the same lock. Marking a
    /// key that is already present writes nothing.
    ///
    /// # Returns
    /// `true` when the key was newly recorded
    pub fn mark_downloaded(&self, content_hash: &str) -> Result<bool, LedgerError> {
        if content_hash.is_empty() || content_hash.contains(RECORD_SEPARATOR) {
            return Err(LedgerError::InvalidKey(content_hash.to_string()));
        }

        let mut state = self.lock_state();
        if state.keys.contains(content_hash) {
            return Ok(false);
        }

        let record = format!("{content_hash}{RECORD_SEPARATOR}");
        let log = &mut state.log;
        log.write_all(record.as_bytes())
            .and_then(|_| log.flush())
            .map_err(|e| LedgerError::IoError(format!("failed to append to ledger log: {e}")))?;
        state.keys.insert(content_hash.to_string());
        Ok(true)
    }

    /// Number of recorded keys
    pub fn len(&self) -> usize {
        self.lock_state().keys.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        // The set is only updated after a successful append, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Split the log into keys
///
/// Also returns the byte length of the terminated prefix; anything after it is a
/// torn trailing record.
fn parse_records(contents: &str) -> (HashSet<String>, usize) {
    let valid_len = contents
        .rfind(RECORD_SEPARATOR)
        .map(|idx| idx + RECORD_SEPARATOR.len_utf8())
        .unwrap_or(0);

    let keys = contents[..valid_len]
        .split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect();
    (keys, valid_len)
}

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Key cannot be stored in the log format
    #[error("invalid ledger key: {0:?}")]
    InvalidKey(String),

    /// Another process holds the ledger
    #[error("lock error: {0}")]
    LockError(String),
}
