//! Smoke tests for the `docforge` binary.
//!
//! Every command runs inside a fresh temp directory containing an empty
//! `.git` marker, so config discovery never climbs into the host checkout.
//! None of these commands reach a completion backend.

use assert_cmd::assert::OutputAssertExt;
use camino::Utf8PathBuf;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

use docforge::{DocumentStore, StageId};

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join(".git")).unwrap();
    temp
}

fn docforge(temp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docforge"));
    cmd.current_dir(temp.path())
        .arg("--output-dir")
        .arg(temp.path().join("output"));
    cmd
}

fn seeded_store(temp: &TempDir) -> DocumentStore {
    let store = DocumentStore::new(Utf8PathBuf::from_path_buf(temp.path().join("output")).unwrap());
    store
        .save("shop", StageId::Brainstorm, "# Brainstorm\n\n- handmade\n")
        .unwrap();
    store
        .save("shop", StageId::Prd, "# PRD\n\n## Goals\n")
        .unwrap();
    store
}

#[test]
fn stages_lists_the_pipeline() {
    let temp = workspace();
    docforge(&temp)
        .arg("stages")
        .assert()
        .success()
        .stdout(predicate::str::contains("brainstorm"))
        .stdout(predicate::str::contains("07-dev-plan.md"));
}

#[test]
fn stages_json_is_machine_readable() {
    let temp = workspace();
    let output = docforge(&temp).args(["stages", "--json"]).output().unwrap();
    assert!(output.status.success());

    let stages: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stages = stages.as_array().unwrap();
    assert_eq!(stages.len(), StageId::ALL.len());
    assert_eq!(stages[0]["id"], "brainstorm");
    assert_eq!(stages[0]["deps"], serde_json::json!([]));
}

#[test]
fn config_json_reports_cli_override_source() {
    let temp = workspace();
    let output = docforge(&temp)
        .args(["--model", "gpt-4o-mini", "config", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["model"]["value"], "gpt-4o-mini");
    assert_eq!(config["model"]["source"], "cli");
    assert_eq!(config["temperature"]["source"], "default");
}

#[test]
fn versions_list_on_unknown_project_is_empty() {
    let temp = workspace();
    docforge(&temp)
        .args(["versions", "list", "ghost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No versions found"));
}

#[test]
fn reverting_a_missing_version_is_a_usage_error() {
    let temp = workspace();
    docforge(&temp)
        .args(["versions", "revert", "ghost", "v1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("v1"));
}

#[test]
fn generate_without_a_project_name_is_a_usage_error() {
    let temp = workspace();
    docforge(&temp).arg("generate").assert().code(2);
}

#[test]
fn generate_rejects_unknown_stage() {
    let temp = workspace();
    docforge(&temp)
        .args(["generate", "shop", "--stage", "marketing"])
        .assert()
        .failure();
}

#[test]
fn checkpoint_then_report_from_the_command_line() {
    let temp = workspace();
    let store = seeded_store(&temp);

    docforge(&temp)
        .args([
            "versions",
            "checkpoint",
            "shop",
            "--id",
            "20260301_120000_000",
            "--label",
            "first draft",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("20260301_120000_000"));
    assert_eq!(
        store.list_versions("shop").unwrap(),
        vec!["20260301_120000_000"]
    );

    docforge(&temp)
        .args(["versions", "report", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first draft"));

    // the same id cannot be reused
    docforge(&temp)
        .args([
            "versions",
            "checkpoint",
            "shop",
            "--id",
            "20260301_120000_000",
        ])
        .assert()
        .failure();
}
