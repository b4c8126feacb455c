//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("innkeep").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("user"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("innkeep").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Directory room images are stored in"));
}

#[test]
fn test_user_add_help() {
    let mut cmd = Command::cargo_bin("innkeep").unwrap();
    cmd.arg("user").arg("add").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Role: client, manager or admin"));
}

#[test]
fn test_user_add_rejects_unknown_role() {
    let mut cmd = Command::cargo_bin("innkeep").unwrap();
    cmd.args(["user", "add", "--email", "a@b.co", "--name", "A", "--role", "owner"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid role value"));
}

#[test]
fn test_migrate_without_database_url() {
    let mut cmd = Command::cargo_bin("innkeep").unwrap();
    cmd.arg("migrate").env_remove("DATABASE_URL").current_dir(std::env::temp_dir());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL not set"));
}
