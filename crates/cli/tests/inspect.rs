// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for offline inspection

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use std::io::Write;

use common::rl;
use predicates::prelude::*;
use rl_storage::frame::encode_header;
use rl_storage::{Store, StoreConfig};
use tempfile::TempDir;

fn write_records(dir: &TempDir, values: &[&[u8]]) -> std::path::PathBuf {
    let path = dir.path().join("records.log");
    let store = Store::open(&path, &StoreConfig::default()).unwrap();
    for value in values {
        store.append(value).unwrap();
    }
    store.close().unwrap();
    path
}

#[test]
fn test_inspect_lists_frames() {
    let dir = TempDir::new().unwrap();
    let path = write_records(&dir, &[b"hello world", b"hello world", b"hello world"]);

    rl(dir.path())
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(57 bytes)"))
        .stdout(predicate::str::is_match(r"\s2\s+38\s+11\s+hello world").unwrap())
        .stdout(predicate::str::contains("3 records"))
        .stdout(predicate::str::contains("torn").not());
}

#[test]
fn test_inspect_json_output() {
    let dir = TempDir::new().unwrap();
    let path = write_records(&dir, &[b"alpha", b"beta"]);

    let output = rl(dir.path())
        .args(["inspect", "--format", "json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["size"], 8 + 5 + 8 + 4);
    assert_eq!(report["records"][1]["position"], 13);
    assert_eq!(report["records"][1]["preview"], "beta");
    assert!(report["torn_at"].is_null());
}

#[test]
fn test_inspect_reports_torn_tail_without_modifying_file() {
    let dir = TempDir::new().unwrap();
    let path = write_records(&dir, &[b"complete"]);

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(&encode_header(1024)).unwrap();
    file.write_all(b"part").unwrap();
    drop(file);
    let before = std::fs::metadata(&path).unwrap().len();

    rl(dir.path())
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 records"))
        .stdout(predicate::str::contains("torn tail at position 16"));

    assert_eq!(std::fs::metadata(&path).unwrap().len(), before);
}

#[test]
fn test_inspect_limit() {
    let dir = TempDir::new().unwrap();
    let path = write_records(&dir, &[b"a", b"b", b"c", b"d"]);

    rl(dir.path())
        .args(["inspect", "--limit", "2"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records"));
}

#[test]
fn test_inspect_missing_file() {
    let dir = TempDir::new().unwrap();

    rl(dir.path())
        .args(["inspect", "does-not-exist.log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read record log"));
}

#[test]
fn test_inspect_ignores_broken_config() {
    let dir = TempDir::new().unwrap();
    let path = write_records(&dir, &[b"alpha"]);

    rl(dir.path())
        .env("RL_LISTEN_ADDR", "not an address")
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 records"));

    rl(dir.path())
        .env("RL_LISTEN_ADDR", "not an address")
        .arg("status")
        .assert()
        .failure();
}
