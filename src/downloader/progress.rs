//! Progress milestones for an export run.
//!
//! Counts every attempted catalog item (downloaded, skipped, failed) and reports
//! once each time another [`PROGRESS_STEP_PERCENT`] of the catalog is behind us.

use std::time::{Duration, Instant};

use super::config::PROGRESS_STEP_PERCENT;

/// Progress state for one engine run.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Items attempted so far.
    pub attempted: u64,
    /// Catalog size.
    pub total: u64,
    /// Timestamp when the run started.
    pub start_time: Instant,
    /// Last reported milestone, in units of `step_percent`.
    pub last_milestone: u64,
    /// Percentage of the catalog between two milestones.
    pub step_percent: u64,
}

impl ProgressState {
    /// Create a progress state for a catalog of `total` items.
    pub fn new(total: u64) -> Self {
        Self {
            attempted: 0,
            total,
            start_time: Instant::now(),
            last_milestone: 0,
            step_percent: PROGRESS_STEP_PERCENT,
        }
    }

    /// Count one more attempted item.
    ///
    /// Returns `true` when a progress line is due; the milestone is consumed.
    pub fn advance(&mut self) -> bool {
        self.attempted = self.attempted.saturating_add(1);
        if self.total == 0 {
            return false;
        }
        // Integer percent keeps milestones exact
        let milestone = self.attempted * 100 / self.total / self.step_percent.max(1);
        if milestone > self.last_milestone || self.attempted == self.total {
            self.last_milestone = milestone;
            return true;
        }
        false
    }

    /// Completion percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.attempted as f64 / self.total as f64) * 100.0
    }

    /// Items per second since the run started.
    pub fn rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.attempted as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Estimated time to finish the remaining items.
    pub fn estimate_remaining(&self) -> Option<Duration> {
        let rate = self.rate();
        let remaining = self.total.saturating_sub(self.attempted);
        if rate > 0.0 && remaining > 0 {
            Some(Duration::from_secs_f64(remaining as f64 / rate))
        } else {
            None
        }
    }

    /// Human-readable progress string for logging.
    pub fn format_progress(&self) -> String {
        let mut parts = vec![format!(
            "[PROGRESS] {}/{} photos - {:.1}% complete",
            self.attempted,
            self.total,
            self.percentage()
        )];

        if let Some(remaining) = self.estimate_remaining() {
            parts.push(format!("- ~{} remaining", format_duration(remaining)));
        }

        parts.join(" ")
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
