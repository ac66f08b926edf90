//! Download configuration constants

/// Default number of photos transferred at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound accepted for the concurrency limit.
/// More parallel transfers than this only trip the service's abuse protection.
pub const MAX_CONCURRENCY: usize = 32;

/// Percentage of the catalog between two progress log lines.
pub const PROGRESS_STEP_PERCENT: u64 = 10;

/// Clamp a requested concurrency limit into `1..=MAX_CONCURRENCY`
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY)
}
