//! Best-effort restoration of a photo's original creation time
//!
//! Callers ignore failures beyond a debug log: a wrong timestamp is cosmetic.

use std::fs::{FileTimes, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Applies an original timestamp to a written file
pub trait TimestampRestorer: Send + Sync {
    /// Set the file's timestamps to `created`
    fn restore(&self, path: &Path, created: SystemTime) -> io::Result<()>;
}

/// Sets accessed and modified times (plus creation time on Windows)
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTimesRestorer;

impl TimestampRestorer for FileTimesRestorer {
    fn restore(&self, path: &Path, created: SystemTime) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        let times = FileTimes::new().set_accessed(created).set_modified(created);

        #[cfg(windows)]
        let times = {
            use std::os::windows::fs::FileTimesExt;
            times.set_created(created)
        };

        file.set_times(times)
    }
}

/// Leaves timestamps untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimestamps;

impl TimestampRestorer for NoopTimestamps {
    fn restore(&self, _path: &Path, _created: SystemTime) -> io::Result<()> {
        Ok(())
    }
}

/// Restorer used when none is configured
pub fn default_restorer() -> Arc<dyn TimestampRestorer> {
    Arc::new(FileTimesRestorer)
}
