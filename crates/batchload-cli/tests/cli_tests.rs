//! Binary-level tests for the `batchload` command

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn batchload(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("batchload").unwrap();
    cmd.current_dir(dir)
        .env_remove("BATCHLOAD_DB_USER")
        .env_remove("BATCHLOAD_DB_PASSWORD")
        .env("LOG_OUTPUT", "console");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    batchload(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("sources"))
        .stdout(predicate::str::contains("init-ledger"));
}

#[test]
fn test_missing_subcommand_prints_help() {
    let dir = tempfile::tempdir().unwrap();
    batchload(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_ingest_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    batchload(dir.path())
        .args(["ingest", "--file", "nope.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found: 'nope.csv'"));
}

#[test]
fn test_sources_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    batchload(dir.path())
        .arg("sources")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("BATCHLOAD_DB_USER not set"));
}

#[test]
fn test_markdown_help() {
    let dir = tempfile::tempdir().unwrap();
    batchload(dir.path())
        .arg("--markdown-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("batchload ingest"));
}
