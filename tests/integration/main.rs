//! Integration tests for the Neurite CLI
//!
//! These tests run the built binary against tree files on disk.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BIFURCATION: &str = r#"{
    "label": "fork",
    "paths": [
        {"name": "trunk", "type": "dendrite",
         "points": [{"x": 0, "y": 0, "z": 0}, {"x": 1, "y": 0, "z": 0}]},
        {"name": "left", "type": "dendrite",
         "points": [{"x": 1, "y": 0, "z": 0}, {"x": 2, "y": 1, "z": 0}],
         "start_join": {"parent": 0, "index": 1}},
        {"name": "right", "type": "axon",
         "points": [{"x": 1, "y": 0, "z": 0}, {"x": 2, "y": -1, "z": 0}],
         "start_join": {"parent": 0, "index": 1}}
    ]
}"#;

fn neurite(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_neurite"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute neurite")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "neurite failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_invocation() {
    let dir = TempDir::new().unwrap();
    let output = neurite(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Topology analysis of traced neuronal reconstructions"));

    let output = neurite(dir.path(), &["version"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Neurite v"));
}

#[test]
fn test_summary_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    let value = stdout_json(&neurite(dir.path(), &["--format", "json", "summary", "fork.json"]));
    let row = &value[0];
    assert_eq!(row["label"], "fork");
    assert_eq!(row["n_paths"], 3);
    assert_eq!(row["n_branch_points"], 1);
    assert_eq!(row["n_tips"], 3);
    assert_eq!(row["strahler_number"], 2);
}

#[test]
fn test_summary_table_by_type() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    let output = neurite(dir.path(), &["summary", "--by-type", "fork.json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fork [axon]"));
    assert!(stdout.contains("fork [(basal) dendrite]"));
    assert!(stdout.contains("strahler number"));
}

#[test]
fn test_strahler_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    let value = stdout_json(&neurite(dir.path(), &["-f", "json", "strahler", "fork.json"]));
    assert_eq!(value["root_number"], 2);
    assert_eq!(value["branch_counts"]["1"], 2);
    assert_eq!(value["bifurcation_ratios"]["1"], 2.0);
}

#[test]
fn test_path_order_table() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    let output = neurite(dir.path(), &["path-order", "fork.json"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Highest path order: 2"));
}

#[test]
fn test_distance_with_explicit_root() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    let value = stdout_json(&neurite(
        dir.path(),
        &["--format", "json", "distance", "fork.json", "--root", "0,0,0"],
    ));
    assert_eq!(value["min"], 0.0);
    assert_eq!(value["distances"]["0"][1], 1.0);

    let output = neurite(dir.path(), &["distance", "fork.json", "--min", "1"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_restricts_view() {
    let dir = TempDir::new().unwrap();
    write(&dir, "fork.json", BIFURCATION);
    write(
        &dir,
        "neurite.toml",
        "[restrict]\ntypes = [\"dendrite\"]\n\n[output]\nformat = \"json\"\n",
    );
    let value = stdout_json(&neurite(dir.path(), &["summary", "fork.json"]));
    assert_eq!(value[0]["n_paths"], 2);
    assert_eq!(value[0]["strahler_number"], 1);

    let value = stdout_json(&neurite(dir.path(), &["--format", "json", "path-order", "fork.json"]));
    assert_eq!(value["counts"]["2"], 1);
}

#[test]
fn test_invalid_tree_fails() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "cycle.json",
        r#"{"paths": [
            {"points": [{"x": 0, "y": 0, "z": 0}], "start_join": {"parent": 1, "index": 0}},
            {"points": [{"x": 1, "y": 0, "z": 0}], "start_join": {"parent": 0, "index": 0}}
        ]}"#,
    );
    let output = neurite(dir.path(), &["strahler", "cycle.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid topology"));

    let output = neurite(dir.path(), &["summary", "missing.json"]);
    assert!(!output.status.success());
}
