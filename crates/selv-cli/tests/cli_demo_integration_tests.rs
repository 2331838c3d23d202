//! CLI demo integration tests
//!
//! These tests run the `selv` binary and check its change lines, action
//! output, history rendering and error exit path.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn selv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_selv"))
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_logger_demo_prints_timestamped_change_lines() {
    // GIVEN: the counter demo with its timestamping logger
    // WHEN: it runs
    let output = selv(&["logger"]);

    // THEN: the initial write and both increments are logged in order
    assert!(output.status.success());
    let out = stdout(&output);
    let init = out.find("[Counter] value = 0 (initialized)").unwrap();
    let first = out.find("[Counter] value: 0 -> 1").unwrap();
    let second = out.find("[Counter] value: 1 -> 2").unwrap();
    assert!(init < first && first < second);
    assert!(out.lines().any(|l| l.starts_with('[') && l.contains("] [Counter]")));
}

#[test]
fn test_actions_demo_reports_running_totals() {
    let output = selv(&["actions", "--log", "none"]);

    assert!(output.status.success());
    let totals: Vec<String> = stdout(&output)
        .lines()
        .filter(|l| l.starts_with("Total items in inventory"))
        .map(str::to_string)
        .collect();
    assert_eq!(
        totals,
        vec![
            "Total items in inventory: 15",
            "Total items in inventory: 23",
            "Total items in inventory: 20",
            "Total items in inventory: 15",
        ]
    );
}

#[test]
fn test_basic_demo_json_history_is_flat_and_ordered() {
    // GIVEN: JSON output with change lines silenced
    let output = selv(&["basic", "--log", "none", "--json"]);

    // THEN: stdout is one JSON document with strictly increasing sequence numbers
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(doc["type"], "DataModel");
    assert_eq!(doc["format"], "flat");

    let records = doc["history"].as_array().unwrap();
    assert_eq!(records[0]["field"], "name");
    assert!(records[0]["from"].is_null());
    let seqs: Vec<u64> = records.iter().map(|r| r["seq"].as_u64().unwrap()).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_history_demo_field_filter() {
    let output = selv(&["history", "--log", "none", "--field", "title"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Document history (flat, title):"));
    assert!(out.contains("title: 'First Revision' -> 'Final Version'"));
    assert!(!out.contains("content:"));
}

#[test]
fn test_field_filter_with_grouped_format_exits_with_error() {
    // WHEN: a field filter is combined with the grouped layout
    let output = selv(&["history", "--log", "none", "--field", "title", "--format", "grouped"]);

    // THEN: the CLI reports a configuration error and exits non-zero
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: Invalid configuration"));
}

#[test]
fn test_config_file_excludes_fields() {
    // GIVEN: an options file excluding the document body
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("selv.toml");
    fs::write(&config_path, "exclude = [\"content\"]\nlog = \"none\"\n").unwrap();

    // WHEN: the history demo runs with it
    let output = selv(&["history", "--json", "--config", config_path.to_str().unwrap()]);

    // THEN: no record mentions the excluded field
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let fields: Vec<&str> = doc["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(!fields.contains(&"content"));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("selv.toml");
    fs::write(&config_path, "track_everything = true\n").unwrap();

    let output = selv(&["basic", "--config", config_path.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_nested_demo_keeps_separate_ledgers() {
    let output = selv(&["nested"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("[Parent] child = Child instance (initialized)"));
    assert!(out.contains("[Child] value: 100 -> 200"));
    assert!(!out.contains("[Parent] child: "));
}
