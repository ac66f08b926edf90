//! Integration tests for the download engine: admission bound, failure
//! isolation and ledger consistency under concurrency

use crate::support::fake_service::{payload_for, FakePhotoService};
use photo_export::downloader::DownloadEngine;
use photo_export::ledger::DownloadLedger;
use photo_export::output::NoopTimestamps;
use photo_export::{Catalog, CatalogItem};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn item(hash: &str, id: &str, name: &str) -> CatalogItem {
    CatalogItem {
        content_hash: hash.to_string(),
        remote_id: id.to_string(),
        file_name: name.to_string(),
        created_at: 1_600_000_000,
    }
}

fn numbered_catalog(count: usize) -> Catalog {
    Catalog::new(
        (0..count)
            .map(|i| item(&format!("hash-{i}"), &i.to_string(), &format!("photo-{i}.jpg")))
            .collect(),
    )
}

struct Fixture {
    _dir: TempDir,
    output_dir: std::path::PathBuf,
    ledger_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().join("images");
        std::fs::create_dir_all(&output_dir).unwrap();
        let ledger_path = dir.path().join("download.txt");
        Self {
            _dir: dir,
            output_dir,
            ledger_path,
        }
    }

    fn ledger(&self) -> Arc<DownloadLedger> {
        Arc::new(DownloadLedger::open(&self.ledger_path).unwrap())
    }

    fn engine(&self, service: Arc<FakePhotoService>, ledger: Arc<DownloadLedger>) -> DownloadEngine {
        DownloadEngine::new(service, ledger, &self.output_dir)
            .with_timestamps(Arc::new(NoopTimestamps))
    }

    fn ledger_records(&self) -> Vec<String> {
        std::fs::read_to_string(&self.ledger_path)
            .unwrap()
            .split(',')
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_items_never_exceed_limit() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new().with_delay(Duration::from_millis(20)));
    let catalog = numbered_catalog(24);

    let summary = fixture
        .engine(service.clone(), fixture.ledger())
        .with_concurrency(3)
        .download_all(&catalog)
        .await;

    assert_eq!(summary.downloaded, 24);
    assert!(service.peak_in_flight() <= 3, "peak was {}", service.peak_in_flight());
    assert!(service.peak_in_flight() > 1, "items were never overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_successes_leave_one_record_each() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new().with_delay(Duration::from_millis(2)));
    let catalog = numbered_catalog(50);

    let summary = fixture
        .engine(service, fixture.ledger())
        .with_concurrency(16)
        .download_all(&catalog)
        .await;

    assert_eq!(summary.downloaded, 50);
    let records = fixture.ledger_records();
    assert_eq!(records.len(), 50);
    let unique: HashSet<&String> = records.iter().collect();
    assert_eq!(unique.len(), 50);
    assert!(records.iter().all(|r| r.starts_with("hash-")));
}

#[tokio::test]
async fn test_authorization_failure_is_isolated() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new().with_broken_links(&["1"]));
    let catalog = Catalog::new(vec![
        item("x", "1", "x.jpg"),
        item("y", "2", "y.jpg"),
        item("z", "3", "z.jpg"),
    ]);
    let ledger = fixture.ledger();

    let summary = fixture
        .engine(service.clone(), ledger.clone())
        .with_concurrency(3)
        .download_all(&catalog)
        .await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!ledger.is_downloaded("x"));
    assert!(ledger.is_downloaded("y"));
    assert!(ledger.is_downloaded("z"));
    assert!(!fixture.output_dir.join("x.jpg").exists());
    assert_eq!(
        std::fs::read(fixture.output_dir.join("z.jpg")).unwrap(),
        payload_for("3")
    );
    // The failed item never reached the payload request
    assert!(!service.fetched().iter().any(|url| url.ends_with("/1")));
}

#[tokio::test]
async fn test_failed_item_is_retried_on_next_run() {
    let fixture = Fixture::new();
    let catalog = Catalog::new(vec![item("x", "1", "x.jpg"), item("y", "2", "y.jpg")]);

    let flaky = Arc::new(FakePhotoService::new().with_broken_links(&["1"]));
    let first = fixture
        .engine(flaky, fixture.ledger())
        .download_all(&catalog)
        .await;
    assert_eq!(first.failed, 1);

    let healthy = Arc::new(FakePhotoService::new());
    let second = fixture
        .engine(healthy.clone(), fixture.ledger())
        .download_all(&catalog)
        .await;

    assert_eq!(second.downloaded, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(healthy.fetched(), ["https://cdn.test/1"]);
    assert_eq!(fixture.ledger_records(), ["y", "x"]);
}

#[tokio::test]
async fn test_duplicate_hashes_collapse_in_ledger() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new());
    let catalog = Catalog::new(vec![item("same", "1", "a.jpg"), item("same", "2", "b.jpg")]);

    let summary = fixture
        .engine(service, fixture.ledger())
        .with_concurrency(2)
        .download_all(&catalog)
        .await;

    // Both entries were dispatched before either completed
    assert_eq!(summary.downloaded, 2);
    assert!(fixture.output_dir.join("a.jpg").exists());
    assert!(fixture.output_dir.join("b.jpg").exists());
    assert_eq!(fixture.ledger_records(), ["same"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_file_name_different_hashes_keep_both_photos() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new().with_delay(Duration::from_millis(10)));
    let catalog = Catalog::new(vec![
        item("ha", "1", "IMG_0001.JPG"),
        item("hb", "2", "IMG_0001.JPG"),
    ]);
    let ledger = fixture.ledger();

    let summary = fixture
        .engine(service.clone(), ledger.clone())
        .with_concurrency(2)
        .download_all(&catalog)
        .await;

    assert_eq!(summary.downloaded, 2);
    assert!(summary.is_clean());
    assert!(service.peak_in_flight() > 1, "items were never overlapped");
    assert_eq!(
        std::fs::read(fixture.output_dir.join("IMG_0001.JPG")).unwrap(),
        payload_for("1")
    );
    assert_eq!(
        std::fs::read(fixture.output_dir.join("IMG_0001_hb.JPG")).unwrap(),
        payload_for("2")
    );
    assert_eq!(std::fs::read_dir(&fixture.output_dir).unwrap().count(), 2);
    assert!(ledger.is_downloaded("ha"));
    assert!(ledger.is_downloaded("hb"));
}

#[tokio::test]
async fn test_renamed_destination_is_stable_across_runs() {
    let fixture = Fixture::new();
    let catalog = Catalog::new(vec![
        item("ha", "1", "IMG_0001.JPG"),
        item("hb", "2", "IMG_0001.JPG"),
    ]);

    // First run only manages the second item
    let flaky = Arc::new(FakePhotoService::new().with_broken_links(&["1"]));
    fixture
        .engine(flaky, fixture.ledger())
        .download_all(&catalog)
        .await;
    assert!(fixture.output_dir.join("IMG_0001_hb.JPG").exists());

    let healthy = Arc::new(FakePhotoService::new());
    let second = fixture
        .engine(healthy, fixture.ledger())
        .download_all(&catalog)
        .await;

    assert_eq!(second.downloaded, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(
        std::fs::read(fixture.output_dir.join("IMG_0001.JPG")).unwrap(),
        payload_for("1")
    );
    assert_eq!(
        std::fs::read(fixture.output_dir.join("IMG_0001_hb.JPG")).unwrap(),
        payload_for("2")
    );
}

#[tokio::test]
async fn test_empty_catalog_returns_immediately() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new());

    let summary = fixture
        .engine(service.clone(), fixture.ledger())
        .download_all(&Catalog::default())
        .await;

    assert_eq!(summary.total, 0);
    assert!(summary.is_clean());
    assert_eq!(service.link_calls(), 0);
}

#[tokio::test]
async fn test_timestamp_restored_on_written_file() {
    let fixture = Fixture::new();
    let service = Arc::new(FakePhotoService::new());
    let catalog = Catalog::new(vec![item("a", "1", "x.jpg")]);

    // Default restorer
    DownloadEngine::new(service, fixture.ledger(), &fixture.output_dir)
        .download_all(&catalog)
        .await;

    let modified = std::fs::metadata(fixture.output_dir.join("x.jpg"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(
        modified,
        std::time::UNIX_EPOCH + Duration::from_secs(1_600_000_000)
    );
}
