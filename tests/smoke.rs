//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("opsmedic")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Anomaly detection and rule-based remediation",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("opsmedic")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("opsmedic"));
}

#[test]
fn test_serve_subcommand_exists() {
    Command::cargo_bin("opsmedic")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success();
}

#[test]
fn test_push_subcommand_exists() {
    Command::cargo_bin("opsmedic")
        .unwrap()
        .args(["push", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--cpu"));
}

#[test]
fn test_simulate_subcommand_exists() {
    Command::cargo_bin("opsmedic")
        .unwrap()
        .args(["simulate", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--spike-every"));
}
