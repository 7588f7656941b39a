//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("registrar").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn test_migrate_help() {
    let mut cmd = Command::cargo_bin("registrar").unwrap();
    cmd.arg("migrate").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Database URL"));
}

#[test]
fn test_migrate_creates_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrar.db");
    let url = format!("sqlite://{}", path.display());

    let mut cmd = Command::cargo_bin("registrar").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("migrate")
        .arg("--database-url")
        .arg(&url);

    cmd.assert().success();
    assert!(path.exists());
}

#[test]
fn test_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("registrar").unwrap();
    cmd.arg("enroll-everyone");

    cmd.assert().failure();
}
