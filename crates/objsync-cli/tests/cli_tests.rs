//! CLI integration tests for objsync.
//!
//! These tests verify command-line argument parsing, exit codes for
//! configuration errors, and end-to-end transfers over the filesystem
//! backend.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the objsync binary.
fn cmd() -> Command {
    Command::cargo_bin("objsync").unwrap()
}

/// Write a config file plus source bucket fixtures under a tempdir.
/// Returns the config path.
fn write_fixtures(dir: &Path, objects: &[(&str, &[u8])]) -> std::path::PathBuf {
    let src_root = dir.join("src-root");
    let dst_root = dir.join("dst-root");
    fs::create_dir_all(src_root.join("uploads")).unwrap();
    fs::create_dir_all(&dst_root).unwrap();

    for (key, body) in objects {
        let path = src_root.join("uploads").join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }

    let config_path = dir.join("objsync.yaml");
    fs::write(
        &config_path,
        format!(
            "source:\n  root: {}\n  bucket: uploads\ndestination:\n  root: {}\n  bucket: archive\n",
            src_root.display(),
            dst_root.display()
        ),
    )
    .unwrap();
    config_path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--prefix"))
        .stdout(predicate::str::contains("--delete-source"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("objsync"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/objsync.yaml", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_yaml_exits_with_config_code() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "source: [not a mapping").unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_zero_workers_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[]);

    cmd()
        .args(["--config", config.to_str().unwrap(), "run", "--workers", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("max_workers"));
}

#[test]
fn test_validate_prints_effective_options() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[]);

    cmd()
        .args(["--config", config.to_str().unwrap(), "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("uploads"))
        .stdout(predicate::str::contains("Max workers: 5"))
        .stdout(predicate::str::contains("Verify checksums: true"));
}

// =============================================================================
// End-to-End Transfer Tests
// =============================================================================

#[test]
fn test_run_transfers_objects() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(
        dir.path(),
        &[("a.txt", b"0123456789"), ("nested/b.txt", b"hello world")],
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 transferred"));

    let dst = dir.path().join("dst-root").join("archive");
    assert_eq!(fs::read(dst.join("a.txt")).unwrap(), b"0123456789");
    assert_eq!(fs::read(dst.join("nested/b.txt")).unwrap(), b"hello world");
    // Copy, not move: the source still has both objects.
    assert!(dir
        .path()
        .join("src-root/uploads/a.txt")
        .exists());
}

#[test]
fn test_run_output_json() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[("a.txt", b"abc")]);

    cmd()
        .args(["--config", config.to_str().unwrap(), "--output-json", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transferred\": 1"))
        .stdout(predicate::str::contains("\"failed\": 0"));
}

#[test]
fn test_dry_run_moves_nothing() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[("a.txt", b"abc"), ("b.txt", b"defg")]);

    cmd()
        .args(["--config", config.to_str().unwrap(), "run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 objects, 7 bytes"));

    assert!(!dir.path().join("dst-root/archive/a.txt").exists());
}

#[test]
fn test_run_with_prefix_filter() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(
        dir.path(),
        &[("logs/x.log", b"log"), ("data/y.bin", b"bin")],
    );

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "run",
            "--prefix",
            "logs/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 transferred"));

    let dst = dir.path().join("dst-root/archive");
    assert!(dst.join("logs/x.log").exists());
    assert!(!dst.join("data/y.bin").exists());
}

#[test]
fn test_run_delete_source_moves_objects() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[("a.txt", b"move me")]);

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "run",
            "--delete-source",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 transferred"));

    assert!(!dir.path().join("src-root/uploads/a.txt").exists());
    assert!(dir.path().join("dst-root/archive/a.txt").exists());
}

#[test]
fn test_second_run_skips_everything() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[("a.txt", b"abc"), ("b.txt", b"def")]);

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 transferred"));

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 transferred"))
        .stdout(predicate::str::contains("2 skipped"));
}

#[test]
fn test_missing_source_bucket_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = write_fixtures(dir.path(), &[]);
    fs::remove_dir_all(dir.path().join("src-root/uploads")).unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Listing failed"));
}
