//! Integration tests for the chainlink CLI.
//!
//! These run the built binary against a temporary repository.

use chainlink::domain::{WorkItem, WorkflowState};
use rstest::{fixture, rstest};
use tempfile::TempDir;

mod common;
use common::{run_chainlink_in_dir, write_items};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Provides an initialized repository holding WI-101, WI-102 and WI-103
#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_chainlink_in_dir(temp.path(), &["init", "--project", "test", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize chainlink: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    write_items(
        temp.path(),
        &[
            WorkItem::new("WI-101", "Design schema", 8),
            WorkItem::new("WI-102", "Build API", 16).with_status(WorkflowState::InProgress),
            WorkItem::new("WI-103", "Build UI", 16).with_status(WorkflowState::InProgress),
        ],
    );
    temp
}

fn link(dir: &TempDir, source: &str, target: &str, kind: &str) -> std::process::Output {
    run_chainlink_in_dir(dir.path(), &["link", source, target, "--type", kind])
}

fn json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ============================================================================
// Help and Init
// ============================================================================

#[rstest]
fn test_cli_help_lists_commands(temp_dir: TempDir) {
    let output = run_chainlink_in_dir(temp_dir.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "link", "unlink", "deps", "path", "impact", "check-circular", "graph"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[rstest]
fn test_init_creates_repository(temp_dir: TempDir) {
    let output = run_chainlink_in_dir(temp_dir.path(), &["init"]);
    assert!(output.status.success());
    assert!(temp_dir.path().join(".chainlink/config.yaml").exists());
    assert!(temp_dir.path().join(".chainlink/links.jsonl").exists());

    let again = run_chainlink_in_dir(temp_dir.path(), &["init"]);
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("already initialized"));
}

// ============================================================================
// Linking and Analysis
// ============================================================================

#[rstest]
fn test_link_and_path(initialized_dir: TempDir) {
    assert!(link(&initialized_dir, "WI-102", "WI-101", "blocked-by").status.success());
    assert!(link(&initialized_dir, "WI-103", "WI-102", "blocked-by").status.success());

    let report = json(&run_chainlink_in_dir(
        initialized_dir.path(),
        &["--json", "path", "--estimates"],
    ));
    assert_eq!(report["path"], serde_json::json!(["WI-101", "WI-102", "WI-103"]));
    assert_eq!(report["total_effort"], 40);
    assert_eq!(report["estimates"][1]["cumulative_effort"], 24);

    let links = std::fs::read_to_string(initialized_dir.path().join(".chainlink/links.jsonl"))
        .unwrap();
    assert_eq!(links.lines().count(), 2);
}

#[rstest]
fn test_cycle_is_rejected(initialized_dir: TempDir) {
    assert!(link(&initialized_dir, "WI-103", "WI-101", "blocked-by").status.success());

    let output = link(&initialized_dir, "WI-101", "WI-103", "blocked-by");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle"));

    let links = std::fs::read_to_string(initialized_dir.path().join(".chainlink/links.jsonl"))
        .unwrap();
    assert_eq!(links.lines().count(), 1);
}

#[rstest]
fn test_link_unknown_item_fails(initialized_dir: TempDir) {
    let output = link(&initialized_dir, "WI-101", "WI-999", "depends-on");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("WI-999"));
}

#[rstest]
fn test_deps_and_unlink(initialized_dir: TempDir) {
    link(&initialized_dir, "WI-102", "WI-101", "blocked-by");
    link(&initialized_dir, "WI-103", "WI-102", "depends-on");

    let report = json(&run_chainlink_in_dir(
        initialized_dir.path(),
        &["--json", "deps", "WI-103", "--transitive"],
    ));
    let ids: Vec<&str> = report["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["WI-102", "WI-101"]);

    let output = run_chainlink_in_dir(
        initialized_dir.path(),
        &["unlink", "WI-103", "WI-102", "--type", "depends-on"],
    );
    assert!(output.status.success());

    let output = run_chainlink_in_dir(
        initialized_dir.path(),
        &["unlink", "WI-103", "WI-102", "--type", "depends-on"],
    );
    assert!(!output.status.success());
}

#[rstest]
fn test_impact_with_delay(initialized_dir: TempDir) {
    link(&initialized_dir, "WI-102", "WI-101", "blocked-by");
    link(&initialized_dir, "WI-103", "WI-102", "blocked-by");

    let report = json(&run_chainlink_in_dir(
        initialized_dir.path(),
        &["--json", "impact", "WI-101", "--delay", "3"],
    ));
    assert_eq!(report["on_critical_path"], true);
    assert_eq!(report["total_impact"], serde_json::json!(["WI-102", "WI-103"]));
    assert_eq!(report["delay"]["effort_delta"], 3);
}

#[rstest]
fn test_check_circular_reports_loaded_cycle_and_conflicts(initialized_dir: TempDir) {
    std::fs::write(
        initialized_dir.path().join(".chainlink/links.jsonl"),
        concat!(
            r#"{"source":"WI-101","target":"WI-102","type":"blocked-by"}"#,
            "\n",
            r#"{"source":"WI-102","target":"WI-101","type":"blocked-by"}"#,
            "\n",
            r#"{"source":"WI-102","target":"WI-103","type":"conflicts-with"}"#,
            "\n",
        ),
    )
    .unwrap();

    let report = json(&run_chainlink_in_dir(
        initialized_dir.path(),
        &["--json", "check-circular"],
    ));
    assert_eq!(report["has_cycles"], true);
    assert_eq!(report["cycles"].as_array().unwrap().len(), 1);
    assert_eq!(report["conflicts"].as_array().unwrap().len(), 1);

    // the critical path cannot be computed until the cycle is broken
    let output = run_chainlink_in_dir(initialized_dir.path(), &["path"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Circular dependency"));
}

#[rstest]
fn test_text_output(initialized_dir: TempDir) {
    link(&initialized_dir, "WI-102", "WI-101", "blocked-by");

    let output = run_chainlink_in_dir(initialized_dir.path(), &["path", "--blockers"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("WI-101"));
    assert!(stdout.contains("blocks 1 directly"));
}

#[rstest]
fn test_item_position_is_one_based(initialized_dir: TempDir) {
    link(&initialized_dir, "WI-102", "WI-101", "blocked-by");
    link(&initialized_dir, "WI-103", "WI-102", "blocked-by");

    let output = run_chainlink_in_dir(initialized_dir.path(), &["path", "--item", "WI-103"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("step 3 of 3"), "unexpected output: {stdout}");

    let output = run_chainlink_in_dir(initialized_dir.path(), &["path", "--item", "WI-101"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("step 1 of 3"));

    let report = json(&run_chainlink_in_dir(
        initialized_dir.path(),
        &["--json", "path", "--item", "WI-102"],
    ));
    assert_eq!(report["position"], 2);
    assert_eq!(report["on_critical_path"], true);
}

#[rstest]
fn test_commands_outside_repository_fail(temp_dir: TempDir) {
    let output = run_chainlink_in_dir(temp_dir.path(), &["path"]);
    // a parent of the tempdir could itself be a chainlink repository
    if !output.status.success() {
        assert!(String::from_utf8_lossy(&output.stderr).contains("Not a chainlink repository"));
    }
}
