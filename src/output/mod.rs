//! Payload persistence
//!
//! - [`file`] streams a payload into the output directory
//! - [`timestamps`] restores the original creation time on written files
//! - [`DestinationPlanner`] gives every content hash its own destination path

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod file;
pub mod timestamps;

pub use file::write_payload;
pub use timestamps::{default_restorer, FileTimesRestorer, NoopTimestamps, TimestampRestorer};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// File name would escape the output directory
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Payload stream failed mid-transfer
    #[error("payload stream error: {0}")]
    StreamError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Sanitize a remote file name for use inside the output directory
///
/// - `/`, `\`, `:` → `_` (directory and drive separators)
/// - empty, `.`, `..` → rejected
pub fn sanitize_file_name(name: &str) -> OutputResult<String> {
    let sanitized = name.trim().replace(['/', '\\', ':'], "_");
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(OutputError::InvalidFileName(name.to_string()));
    }
    Ok(sanitized)
}

/// Destination path for `file_name` under `output_dir`
pub fn output_path(output_dir: &Path, file_name: &str) -> OutputResult<PathBuf> {
    Ok(output_dir.join(sanitize_file_name(file_name)?))
}

/// Assigns destination paths within one output directory
///
/// The first item to use a file name keeps it. A later item with a different
/// content hash under the same name gets `<stem>_<hash>.<ext>`. Names are
/// compared case-insensitively. Claims made in catalog order are stable across
/// runs, so a resumed export reuses the same paths.
#[derive(Debug)]
pub struct DestinationPlanner {
    output_dir: PathBuf,
    // lowercased file name -> content hash
    claimed: HashMap<String, String>,
}

impl DestinationPlanner {
    /// Planner for `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            claimed: HashMap::new(),
        }
    }

    /// Destination for the item named `file_name` with `content_hash`
    ///
    /// The same hash always receives the same path.
    pub fn claim(&mut self, file_name: &str, content_hash: &str) -> OutputResult<PathBuf> {
        let sanitized = sanitize_file_name(file_name)?;
        let mut candidate = sanitized.clone();
        let mut attempt = 0usize;

        loop {
            let key = candidate.to_lowercase();
            match self.claimed.get(&key) {
                Some(owner) if owner != content_hash => {
                    attempt += 1;
                    candidate = sanitize_file_name(&suffixed(&sanitized, content_hash, attempt))?;
                }
                Some(_) => return output_path(&self.output_dir, &candidate),
                None => {
                    self.claimed.insert(key, content_hash.to_string());
                    return output_path(&self.output_dir, &candidate);
                }
            }
        }
    }
}

fn suffixed(name: &str, content_hash: &str, attempt: usize) -> String {
    let tag = if attempt == 1 {
        content_hash.to_string()
    } else {
        format!("{content_hash}_{attempt}")
    };
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{tag}{}", &name[..dot], &name[dot..]),
        _ => format!("{name}_{tag}"),
    }
}
