//! Integration tests for logging and tracing

use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[test]
fn test_default_filter_parses() {
    let filter = EnvFilter::new("photo_export=info");
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
}

#[test]
fn test_json_subscriber_initialization() {
    // Another test may have installed the global subscriber first
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("photo_export=debug"))
        .with_test_writer()
        .try_init();

    info!(content_hash = "abc", file_name = "x.jpg", "Structured field logging");
    warn!(remote_id = "1", "Structured warning");
}

#[test]
fn test_credential_never_reaches_logs() {
    let credential = photo_export::Credential::new("BDUSS=super-secret").unwrap();
    let rendered = format!("{credential} {credential:?}");
    assert!(!rendered.contains("super-secret"));
}
