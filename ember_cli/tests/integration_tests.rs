//! Integration tests for the ember binary.
//!
//! These tests verify end-to-end behavior including:
//! - Counting cigarettes and persisting day records
//! - Reduction plan lifecycle
//! - Challenge subscription and eager resolution
//! - Statistics and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI bound to `dir` for data and config, with a fixed "today"
fn cli(dir: &Path, date: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ember"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--date")
        .arg(date);
    cmd
}

fn read_store(dir: &Path, key: &str) -> Value {
    let path = dir.join("data/store").join(format!("{}.json", key));
    let contents = fs::read_to_string(&path).expect("Failed to read store file");
    serde_json::from_str(&contents).expect("Store file is not JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("ember"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cigarette reduction tracker"));
}

#[test]
fn test_add_and_remove_are_persisted() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    for _ in 0..2 {
        cli(dir, "2024-09-01")
            .args(["add", "morning"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added morning cigarette"));
    }
    cli(dir, "2024-09-01").args(["add", "evening"]).assert().success();
    cli(dir, "2024-09-01")
        .args(["remove", "morning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("today: 2"));

    let days = read_store(dir, "cigarettes");
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["date"], "2024-09-01");
    assert_eq!(days[0]["morning"], 1);
    assert_eq!(days[0]["evening"], 1);

    // Entries made with --date leave the last-cigarette time alone
    assert!(!dir.join("data/store/last_cigarette_time.json").exists());
}

#[test]
fn test_remove_clamps_at_zero() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["remove", "afternoon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("today: 0"));

    let days = read_store(dir, "cigarettes");
    assert_eq!(days[0]["afternoon"], 0);
}

#[test]
fn test_unknown_period_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path(), "2024-09-01")
        .args(["add", "noon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown period"));
}

#[test]
fn test_days_are_kept_separately() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01").args(["add", "morning"]).assert().success();
    cli(dir, "2024-09-02").args(["add", "evening"]).assert().success();

    cli(dir, "2024-09-02")
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("Evening:   1"))
        .stdout(predicate::str::contains("Morning:   0"));

    cli(dir, "2024-09-02")
        .args(["delete-day", "2024-09-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 2024-09-01"));

    let days = read_store(dir, "cigarettes");
    assert_eq!(days.as_array().unwrap().len(), 1);
}

#[test]
fn test_plan_start_show_and_feedback() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["plan", "start", "--starting", "5", "--pace", "fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 stages"));

    let plan = read_store(dir, "reduction_plan");
    let stages = plan["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages[0]["status"], "active");
    assert_eq!(stages[0]["to"], 4);
    assert_eq!(stages[4]["to"], 0);
    assert_eq!(stages[4]["duration"], 7);

    for _ in 0..5 {
        cli(dir, "2024-09-01").args(["add", "afternoon"]).assert().success();
    }

    cli(dir, "2024-09-01")
        .args(["plan", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Goal: 4, current: 5"));
}

#[test]
fn test_plan_start_clamps_starting_count() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["plan", "start", "--starting", "80"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clamped to 50"));

    let plan = read_store(dir, "reduction_plan");
    assert_eq!(plan["stages"].as_array().unwrap().len(), 50);
    assert_eq!(plan["pace"], "moderate");
}

#[test]
fn test_plan_advance() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["plan", "start", "--starting", "2", "--pace", "slow"])
        .assert()
        .success();

    cli(dir, "2024-09-07")
        .args(["plan", "advance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage 2 active: max 0 cigarettes/day for 7 days"));

    cli(dir, "2024-09-14")
        .args(["plan", "advance", "--failed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan finished"));

    let plan = read_store(dir, "reduction_plan");
    assert_eq!(plan["stages"][0]["status"], "completed");
    assert_eq!(plan["stages"][1]["status"], "failed");

    cli(dir, "2024-09-15")
        .args(["plan", "advance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already finished"));
}

#[test]
fn test_plan_show_without_plan_fails() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path(), "2024-09-01")
        .args(["plan", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No reduction plan"));
}

#[test]
fn test_challenge_list_shows_all_tiers() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path(), "2024-09-01")
        .args(["challenge", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("easy_hydration"))
        .stdout(predicate::str::contains("medium_pause"))
        .stdout(predicate::str::contains("hard_radical"));
}

#[test]
fn test_second_active_subscription_rejected() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["challenge", "subscribe", "hard_day"])
        .assert()
        .success();

    cli(dir, "2024-09-01")
        .args(["challenge", "subscribe", "easy_no_smoke"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already active"));

    let subs = read_store(dir, "subscribed_challenges");
    let subs = subs.as_array().unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["id"], "hard_day");
    assert_eq!(subs[0]["status"], "active");
}

#[test]
fn test_first_cigarette_loses_hard_day() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["challenge", "subscribe", "hard_day"])
        .assert()
        .success();

    cli(dir, "2024-09-01")
        .args(["add", "morning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Challenge 'hard_day' lost"));

    // Already resolved, so nothing is reported again
    cli(dir, "2024-09-01")
        .args(["add", "morning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Challenge").not());

    cli(dir, "2024-09-01")
        .args(["challenge", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hard_day (2024-09-01): lost"));

    // A resolved challenge frees the slot
    cli(dir, "2024-09-01")
        .args(["challenge", "subscribe", "easy_no_smoke"])
        .assert()
        .success();
}

#[test]
fn test_unsubscribe() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .args(["challenge", "subscribe", "medium_pause"])
        .assert()
        .success();
    cli(dir, "2024-09-01")
        .args(["challenge", "unsubscribe", "medium_pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unsubscribed"));
    cli(dir, "2024-09-01")
        .args(["challenge", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No challenges subscribed"));
}

#[test]
fn test_tags_and_strategies_in_stats() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01").args(["add", "morning"]).assert().success();
    cli(dir, "2024-09-01").args(["tag", "coffee"]).assert().success();
    cli(dir, "2024-09-01")
        .args(["tag", "coffee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already recorded"));
    cli(dir, "2024-09-01").args(["strategy", "walk"]).assert().success();

    let output = cli(dir, "2024-09-01")
        .args(["stats", "--json"])
        .output()
        .expect("Failed to run stats");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("stats is not JSON");
    assert_eq!(report["weekly_total"], 1);
    assert_eq!(report["yearly_total"], 1);
    assert_eq!(report["tag_frequency"]["coffee"], 1);
    assert_eq!(report["strategy_frequency"]["walk"], 1);

    let profile = read_store(dir, "profile");
    assert_eq!(profile["tags"][0], "coffee");
    assert_eq!(profile["strategies"][0], "walk");
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let csv_path = dir.join("out/history.csv");

    cli(dir, "2024-09-01").args(["add", "evening"]).assert().success();
    cli(dir, "2024-09-02").args(["add", "morning"]).assert().success();

    cli(dir, "2024-09-02")
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 days"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(contents.lines().count(), 3); // header + 2 days
    assert!(contents.contains("2024-09-01,0,0,1,1,,"));
}

#[test]
fn test_workout_logged_once() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir, "2024-09-01")
        .arg("workout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout logged"));
    cli(dir, "2024-09-01")
        .arg("workout")
        .assert()
        .success()
        .stdout(predicate::str::contains("already logged"));
}
