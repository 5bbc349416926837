//! Smoke tests for the `release_flow` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn release_flow() -> Command {
    let mut cmd = Command::cargo_bin("release_flow").unwrap();
    for var in [
        "GITHUB_EVENT_PATH",
        "GITHUB_REPOSITORY",
        "GITHUB_OUTPUT",
        "GH_TOKEN",
        "GITHUB_TOKEN",
        "FEATURE_FREEZE",
        "FREEZE_OVERRIDE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_every_subcommand() {
    release_flow()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("merge")
                .and(predicate::str::contains("check"))
                .and(predicate::str::contains("start-train"))
                .and(predicate::str::contains("next-prerelease"))
                .and(predicate::str::contains("stamp")),
        );
}

#[test]
fn stamp_writes_prerelease_version() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("VERSION"), "1.3.0\n").unwrap();

    release_flow()
        .args(["stamp", "1.4.0", "--pre", "beta2", "--workdir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1.4.0-beta2"));

    assert_eq!(std::fs::read_to_string(dir.path().join("VERSION")).unwrap(), "1.4.0-beta2\n");
}

#[test]
fn stamp_uses_configured_targets_and_exports_outputs() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("Cargo.toml"),
        "[package]\nname = \"app\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("release-flow.toml"),
        "[[stamp]]\npath = \"Cargo.toml\"\n",
    )
    .unwrap();
    let outputs = dir.path().join("outputs");

    release_flow()
        .args(["stamp", "2.0.0", "--json", "--workdir"])
        .arg(dir.path())
        .env("GITHUB_OUTPUT", &outputs)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fileType\": \"cargo\""));

    let manifest = std::fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
    assert!(manifest.contains("version = \"2.0.0\""));
    assert!(manifest.contains("name = \"app\""));
    assert!(std::fs::read_to_string(outputs).unwrap().starts_with("files=["));
}

#[test]
fn malformed_version_is_rejected() {
    release_flow()
        .args(["stamp", "1.0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid version '1.0'"));
}

#[test]
fn start_train_requires_repository() {
    let dir = TempDir::new().unwrap();

    release_flow()
        .args(["start-train", "1.3.0", "--workdir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Repository context missing").and(predicate::str::contains("GITHUB_REPOSITORY")));
}

#[test]
fn merge_reports_missing_event_document() {
    let dir = TempDir::new().unwrap();

    release_flow()
        .args(["merge", "--repo", "acme/app", "--event"])
        .arg(dir.path().join("missing.json"))
        .arg("--workdir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Event source not found"));
}

#[test]
fn invalid_config_file_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("release-flow.toml"), "remote = [\n").unwrap();

    release_flow()
        .args(["stamp", "1.0.0", "--workdir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("release-flow.toml"));
}
