//! Integration tests for resuming an export from the ledger

use crate::support::fake_service::{entry, payload_for, FakePhotoService};
use photo_export::catalog::{CatalogBuilder, CatalogSnapshot};
use photo_export::downloader::DownloadEngine;
use photo_export::ledger::DownloadLedger;
use photo_export::output::NoopTimestamps;
use photo_export::{Catalog, CatalogItem};
use std::sync::Arc;
use tempfile::TempDir;

fn item(hash: &str, id: &str, name: &str) -> CatalogItem {
    CatalogItem {
        content_hash: hash.to_string(),
        remote_id: id.to_string(),
        file_name: name.to_string(),
        created_at: 0,
    }
}

async fn run(
    service: Arc<FakePhotoService>,
    ledger_path: &std::path::Path,
    output_dir: &std::path::Path,
    catalog: &Catalog,
) -> photo_export::downloader::DownloadSummary {
    let ledger = Arc::new(DownloadLedger::open(ledger_path).unwrap());
    DownloadEngine::new(service, ledger, output_dir)
        .with_concurrency(2)
        .with_timestamps(Arc::new(NoopTimestamps))
        .download_all(catalog)
        .await
}

#[tokio::test]
async fn test_end_to_end_then_rerun_fetches_nothing() {
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("download.txt");
    let output_dir = dir.path().join("images");
    std::fs::create_dir_all(&output_dir).unwrap();
    let catalog = Catalog::new(vec![item("a", "1", "x.jpg"), item("b", "2", "y.jpg")]);

    let service = Arc::new(FakePhotoService::new());
    let summary = run(service.clone(), &ledger_path, &output_dir, &catalog).await;

    assert_eq!(summary.downloaded, 2);
    assert_eq!(std::fs::read(output_dir.join("x.jpg")).unwrap(), payload_for("1"));
    assert_eq!(std::fs::read(output_dir.join("y.jpg")).unwrap(), payload_for("2"));
    let log = std::fs::read_to_string(&ledger_path).unwrap();
    assert!(log == "a,b," || log == "b,a,", "unexpected ledger log {log:?}");

    let rerun_service = Arc::new(FakePhotoService::new());
    let rerun = run(rerun_service.clone(), &ledger_path, &output_dir, &catalog).await;

    assert_eq!(rerun.skipped, 2);
    assert_eq!(rerun.downloaded, 0);
    assert_eq!(rerun_service.link_calls(), 0);
    assert!(rerun_service.fetched().is_empty());
    assert_eq!(std::fs::read_to_string(&ledger_path).unwrap(), log);
}

#[tokio::test]
async fn test_only_unrecorded_items_are_attempted() {
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("download.txt");
    let output_dir = dir.path().join("images");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(&ledger_path, "h1,h3,").unwrap();

    let catalog = Catalog::new(vec![
        item("h1", "1", "one.jpg"),
        item("h2", "2", "two.jpg"),
        item("h3", "3", "three.jpg"),
        item("h4", "4", "four.jpg"),
    ]);
    let service = Arc::new(FakePhotoService::new());
    let summary = run(service.clone(), &ledger_path, &output_dir, &catalog).await;

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.downloaded, 2);
    let mut fetched = service.fetched();
    fetched.sort();
    assert_eq!(fetched, ["https://cdn.test/2", "https://cdn.test/4"]);
    assert!(!output_dir.join("one.jpg").exists());
}

#[tokio::test]
async fn test_torn_ledger_record_is_downloaded_again() {
    let dir = TempDir::new().unwrap();
    let ledger_path = dir.path().join("download.txt");
    let output_dir = dir.path().join("images");
    std::fs::create_dir_all(&output_dir).unwrap();
    // Crash while appending "h2,"
    std::fs::write(&ledger_path, "h1,h2").unwrap();

    let catalog = Catalog::new(vec![item("h1", "1", "one.jpg"), item("h2", "2", "two.jpg")]);
    let service = Arc::new(FakePhotoService::new());
    let summary = run(service.clone(), &ledger_path, &output_dir, &catalog).await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(std::fs::read_to_string(&ledger_path).unwrap(), "h1,h2,");
}

#[tokio::test]
async fn test_snapshot_and_ledger_resume_together() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("imageList.json");
    let ledger_path = dir.path().join("download.txt");
    let output_dir = dir.path().join("images");
    std::fs::create_dir_all(&output_dir).unwrap();

    let pages = vec![
        vec![entry("a", "1", "/youai/x.jpg")],
        vec![entry("b", "2", "/youai/y.jpg")],
    ];

    let first = Arc::new(FakePhotoService::new().with_pages(pages.clone()).with_broken_links(&["2"]));
    let catalog = CatalogBuilder::new(first.clone(), CatalogSnapshot::new(&snapshot))
        .build()
        .await
        .unwrap();
    let summary = run(first, &ledger_path, &output_dir, &catalog).await;
    assert_eq!(summary.failed, 1);

    let second = Arc::new(FakePhotoService::new().with_pages(pages));
    let catalog = CatalogBuilder::new(second.clone(), CatalogSnapshot::new(&snapshot))
        .build()
        .await
        .unwrap();
    let summary = run(second.clone(), &ledger_path, &output_dir, &catalog).await;

    assert_eq!(second.list_calls(), 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.downloaded, 1);
    assert!(output_dir.join("y.jpg").exists());
}
