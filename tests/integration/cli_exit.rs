//! Integration tests for the binary's fatal-exit behavior

use assert_cmd::Command;
use tempfile::TempDir;

fn photo_export() -> Command {
    let mut cmd = Command::cargo_bin("photo-export").unwrap();
    cmd.env("RUST_LOG", "photo_export=info");
    cmd
}

#[test]
fn test_missing_credential_exits_nonzero() {
    let dir = TempDir::new().unwrap();

    photo_export()
        .arg("--work-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1);

    // Fails before the ledger or output directory are created
    assert!(!dir.path().join("download.txt").exists());
    assert!(!dir.path().join("images").exists());
}

#[test]
fn test_empty_credential_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cookie.txt"), "  \n").unwrap();

    photo_export()
        .arg("--work-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_unreachable_service_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("cookie.txt"), "BDUSS=abc").unwrap();

    // Nothing listens on port 9 of localhost
    photo_export()
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--base-url")
        .arg("http://127.0.0.1:9")
        .assert()
        .failure()
        .code(1);

    assert!(!dir.path().join("imageList.json").exists());
}

#[test]
fn test_invalid_concurrency_is_usage_error() {
    photo_export()
        .args(["--concurrency", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_help_lists_options() {
    let output = photo_export().arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in ["--work-dir", "--concurrency", "--refresh-catalog", "--ledger-file"] {
        assert!(help.contains(flag), "help is missing {flag}");
    }
    assert!(!help.contains("--base-url"));
}
