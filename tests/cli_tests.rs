//! Integration tests for the reanchor CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Test helper to get the CLI binary
fn reanchor_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reanchor").unwrap();
    cmd.env_remove("REANCHOR_CONFIG");
    cmd
}

const WORKER_V1: &str = r#"def setup(config):
    return Worker(config)


def run(worker, jobs):
    for job in jobs:
        worker.process(job)
"#;

const WORKER_V2: &str = r#"import sys


def setup(config):
    return Worker(config)


def run(worker, jobs):
    for job in jobs:
        worker.process(job)
    sys.stdout.flush()
"#;

fn write_source(root: &Path, text: &str) {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/worker.py"), text).unwrap();
}

#[test]
fn test_help_lists_commands() {
    reanchor_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pin"))
        .stdout(predicate::str::contains("relocate"))
        .stdout(predicate::str::contains("landmarks"));
}

#[test]
fn test_print_default_config_is_valid_yaml() {
    let output = reanchor_cmd()
        .arg("print-default-config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("matching:"));
    assert!(text.contains("acceptance_threshold"));
}

#[test]
fn test_validate_config_accepts_defaults_and_rejects_garbage() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.yml");
    fs::write(
        &good,
        "matching:\n  acceptance_threshold: 0.8\n  use_siblings: true\n",
    )
    .unwrap();

    reanchor_cmd()
        .args(["validate-config", good.to_str().unwrap(), "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid!"));

    let bad = dir.path().join("bad.yml");
    fs::write(&bad, "matching:\n  acceptance_threshold: 3.5\n").unwrap();

    reanchor_cmd()
        .args(["validate-config", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_list_languages() {
    reanchor_cmd()
        .arg("list-languages")
        .assert()
        .success()
        .stdout(predicate::str::contains("Python"))
        .stdout(predicate::str::contains(".rs"));
}

#[test]
fn test_landmarks_of_a_file() {
    let dir = tempdir().unwrap();
    write_source(dir.path(), WORKER_V1);

    reanchor_cmd()
        .args(["landmarks", "--root"])
        .arg(dir.path().join("src"))
        .args(["--file", "worker.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("function_definition"))
        .stdout(predicate::str::contains("for_statement"));
}

#[test]
fn test_pin_then_relocate_after_edit() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("src");
    let store = dir.path().join("points.json");
    write_source(dir.path(), WORKER_V1);

    reanchor_cmd()
        .args(["pin", "--root"])
        .arg(&root)
        .args(["--file", "worker.py", "--line", "5", "--name", "job-loop"])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pinned"));
    assert!(store.exists());

    write_source(dir.path(), WORKER_V2);

    let output = reanchor_cmd()
        .args(["relocate", "--format", "json", "--root"])
        .arg(&root)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let point = &report["points"][0];
    assert_eq!(report["scope"], "local");
    assert_eq!(point["name"], "job-loop");
    assert_eq!(point["status"], "relocated");
    assert_eq!(point["candidates"][0]["line"], 8);
    assert_eq!(point["candidates"][0]["kind"], "function_definition");
}

#[test]
fn test_relocate_without_store_fails() {
    let dir = tempdir().unwrap();

    reanchor_cmd()
        .args(["relocate", "--root"])
        .arg(dir.path())
        .arg("--store")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No point store"));
}
