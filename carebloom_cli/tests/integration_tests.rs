//! Integration tests for the carebloom binary.
//!
//! These tests verify end-to-end behavior including:
//! - Routine materialization into the local cache
//! - Adding, toggling, annotating and deleting events
//! - Reset and CSV export
//! - Offline fallback when the backend is unreachable

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DAY: &str = "2024-06-10";

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary, isolated from the user's config
fn cli(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("carebloom"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd
}

/// Command preloaded with `--offline --data-dir <dir>`
fn offline(home: &Path) -> Command {
    let mut cmd = cli(home);
    cmd.arg("--offline").arg("--data-dir").arg(home.join("data"));
    cmd
}

fn cache_file(home: &Path, patient: &str) -> PathBuf {
    home.join("data")
        .join("cache")
        .join(format!("calendar-events-{}.json", patient))
}

fn cached_events(home: &Path, patient: &str) -> Vec<Value> {
    let content = fs::read_to_string(cache_file(home, patient)).expect("Failed to read cache");
    serde_json::from_str(&content).expect("Cache is not a JSON array")
}

fn event_id(event: &Value) -> String {
    event["id"].as_str().expect("id is not a string").to_string()
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Daily care calendar for memory-care patients",
        ));
}

#[test]
fn test_today_materializes_routine() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home)
        .args(["today", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday, June 10, 2024 - patient 1"))
        .stdout(predicate::str::contains("4 events scheduled"))
        .stdout(predicate::str::contains("Morning Medication"))
        .stdout(predicate::str::contains("Evening Medication"));

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e["date"] == DAY));
    assert!(events.iter().all(|e| e["recurring"] == true));
    assert!(events.iter().all(|e| e["patientId"] == "1"));
    assert_eq!(events[0]["startTime"], "09:00");
    assert_eq!(events[0]["type"], "medication");
}

#[test]
fn test_repeated_views_do_not_duplicate() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    for _ in 0..3 {
        offline(home).args(["today", "--date", DAY]).assert().success();
    }

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 4, "Routine was materialized more than once");
}

#[test]
fn test_each_viewed_day_gets_its_own_routine() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", "2024-06-10"]).assert().success();
    offline(home).args(["today", "--date", "2024-06-11"]).assert().success();

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 8);

    let mut ids: Vec<String> = events.iter().map(event_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8, "Recurring ids collided across days");
}

#[test]
fn test_add_event() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home)
        .args([
            "add",
            "--title",
            "Doctor Appointment",
            "--description",
            "Annual checkup with Dr. Smith",
            "--start",
            "14:00",
            "--end",
            "15:00",
            "--type",
            "appointment",
            "--priority",
            "high",
            "--date",
            DAY,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Added Doctor Appointment on 2024-06-10 at 14:00",
        ));

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 5);
    let added = &events[4];
    assert_eq!(added["title"], "Doctor Appointment");
    assert_eq!(added["type"], "appointment");
    assert_eq!(added["priority"], "high");
    assert_eq!(added["recurring"], false);
    assert_eq!(added["completed"], false);

    offline(home)
        .args(["today", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 events scheduled"))
        .stdout(predicate::str::contains("Annual checkup with Dr. Smith"));
}

#[test]
fn test_add_rejects_end_before_start() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home)
        .args([
            "add", "--title", "Backwards", "--start", "15:00", "--end", "14:00", "--date", DAY,
        ])
        .assert()
        .failure();

    assert!(!cache_file(home, "1").exists() || cached_events(home, "1").len() == 4);
}

#[test]
fn test_add_rejects_bad_time() {
    let temp_dir = setup_test_dir();

    offline(temp_dir.path())
        .args(["add", "--title", "Walk", "--start", "25:00", "--end", "26:00"])
        .assert()
        .failure();
}

#[test]
fn test_toggle_roundtrip() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", DAY]).assert().success();
    let id = event_id(&cached_events(home, "1")[0]);

    offline(home)
        .args(["toggle", &id, "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morning Medication marked complete"));
    assert_eq!(cached_events(home, "1")[0]["completed"], true);

    offline(home)
        .args(["toggle", &id, "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked not complete"));
    assert_eq!(cached_events(home, "1")[0]["completed"], false);
}

#[test]
fn test_toggle_unknown_id_changes_nothing() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", DAY]).assert().success();
    let before = fs::read_to_string(cache_file(home, "1")).unwrap();

    offline(home)
        .args(["toggle", "42", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("No event with id 42"));

    let after = fs::read_to_string(cache_file(home, "1")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_notes_saved_and_cleared() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", DAY]).assert().success();
    let id = event_id(&cached_events(home, "1")[1]);

    offline(home)
        .args(["note", &id, "Enjoyed the wedding photos", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes saved: Enjoyed the wedding photos"));
    assert_eq!(
        cached_events(home, "1")[1]["caregiverNotes"],
        "Enjoyed the wedding photos"
    );

    offline(home)
        .args(["today", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note: Enjoyed the wedding photos"));

    offline(home)
        .args(["note", &id, "  ", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes cleared"));
    assert!(cached_events(home, "1")[1].get("caregiverNotes").is_none());
}

#[test]
fn test_delete_event() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", DAY]).assert().success();
    let id = event_id(&cached_events(home, "1")[2]);

    offline(home)
        .args(["delete", &id, "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted Afternoon Walk"));

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| event_id(e) != id));
}

#[test]
fn test_reset_discards_other_days_and_additions() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", "2024-06-09"]).assert().success();
    offline(home)
        .args(["add", "--title", "Dentist", "--start", "10:30", "--end", "11:00", "--date", DAY])
        .assert()
        .success();
    assert_eq!(cached_events(home, "1").len(), 9);

    offline(home)
        .args(["reset", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Reset events for patient 1: 4 routine events on 2024-06-10",
        ));

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e["date"] == DAY && e["recurring"] == true));
}

#[test]
fn test_unknown_patient_has_empty_routine() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home)
        .args(["--patient", "stranger", "today", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 events scheduled"))
        .stdout(predicate::str::contains("No events scheduled for this day."));

    // Nothing to materialize, nothing written
    assert!(!cache_file(home, "stranger").exists());
}

#[test]
fn test_patients_have_separate_caches() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["--patient", "2", "today", "--date", DAY]).assert().success();
    offline(home).args(["--patient", "3", "today", "--date", DAY]).assert().success();

    assert_eq!(cached_events(home, "2").len(), 4);
    assert_eq!(cached_events(home, "3").len(), 3);
    assert!(!cache_file(home, "1").exists());
}

#[test]
fn test_sorted_listing() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home)
        .args(["add", "--title", "Early Bird Tea", "--start", "06:00", "--end", "06:15", "--date", DAY])
        .assert()
        .success();

    let output = offline(home)
        .args(["today", "--date", DAY, "--sorted"])
        .output()
        .expect("Failed to run today");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    let tea = stdout.find("Early Bird Tea").expect("added event missing");
    let meds = stdout.find("Morning Medication").expect("routine event missing");
    assert!(tea < meds, "--sorted should list 06:00 before 09:00");

    let output = offline(home)
        .args(["today", "--date", DAY])
        .output()
        .expect("Failed to run today");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let tea = stdout.find("Early Bird Tea").unwrap();
    let meds = stdout.find("Morning Medication").unwrap();
    assert!(meds < tea, "unsorted listing keeps stored order");
}

#[test]
fn test_overdue_lists_past_days() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["today", "--date", DAY]).assert().success();

    offline(home)
        .arg("overdue")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overdue events:"))
        .stdout(predicate::str::contains("2024-06-10 09:00 Morning Medication"));
}

#[test]
fn test_completed_events_are_not_overdue() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    offline(home).args(["--patient", "3", "today", "--date", DAY]).assert().success();
    for event in cached_events(home, "3") {
        offline(home)
            .args(["--patient", "3", "toggle", &event_id(&event), "--date", DAY])
            .assert()
            .success();
    }

    offline(home)
        .args(["--patient", "3", "overdue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-06-10").not());
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();
    let out = home.join("reports").join("events.csv");

    offline(home).args(["today", "--date", DAY]).assert().success();

    offline(home)
        .arg("export")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"))
        .stdout(predicate::str::contains("CSV:"));

    let csv_content = fs::read_to_string(&out).expect("Failed to read CSV");
    assert!(csv_content.starts_with("id,date,start_time,end_time,type,priority,title"));
    assert!(csv_content.contains("2024-06-10,09:00,09:15,medication,high,Morning Medication"));
}

#[test]
fn test_unreachable_backend_falls_back_to_cache() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();
    let data_dir = home.join("data");

    offline(home).args(["today", "--date", DAY]).assert().success();
    let id = event_id(&cached_events(home, "1")[0]);

    // Nothing listens on port 1
    cli(home)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--remote-url")
        .arg("http://127.0.0.1:1")
        .args(["toggle", &id, "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked complete"));

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["completed"], true);
}

#[test]
fn test_config_file_templates() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();
    let config_path = home.join("custom.toml");

    fs::write(
        &config_path,
        r#"
[remote]
enabled = false

[calendar]
default_patient = "carol"

[[templates.carol]]
title = "Morning Stretch"
type = "activity"
start_time = "08:00"
end_time = "08:20"
priority = "low"
"#,
    )
    .unwrap();

    cli(home)
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(home.join("data"))
        .args(["today", "--date", DAY])
        .assert()
        .success()
        .stdout(predicate::str::contains("patient carol"))
        .stdout(predicate::str::contains("1 events scheduled"))
        .stdout(predicate::str::contains("Morning Stretch"));

    assert_eq!(cached_events(home, "carol").len(), 1);
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();
    let config_path = home.join("bad.toml");
    fs::write(&config_path, "[remote]\ntimeout_secs = 0\n").unwrap();

    cli(home)
        .arg("--config")
        .arg(&config_path)
        .arg("--offline")
        .arg("--data-dir")
        .arg(home.join("data"))
        .arg("today")
        .assert()
        .failure();
}

#[test]
fn test_invalid_date_fails() {
    let temp_dir = setup_test_dir();

    offline(temp_dir.path())
        .args(["today", "--date", "next tuesday"])
        .assert()
        .failure();
}

#[test]
fn test_far_dates_are_viewable() {
    let temp_dir = setup_test_dir();
    let home = temp_dir.path();

    for day in ["0001-01-01", "1899-12-31", "9999-12-31"] {
        offline(home)
            .args(["today", "--date", day])
            .assert()
            .success()
            .stdout(predicate::str::contains("4 events scheduled"));
    }

    let events = cached_events(home, "1");
    assert_eq!(events.len(), 12);

    let id = event_id(&events[11]);
    assert!(id.contains("9999-12-31"));
    offline(home)
        .args(["toggle", &id, "--date", "9999-12-31"])
        .assert()
        .success();
    assert_eq!(cached_events(home, "1")[11]["completed"], true);
}

#[test]
fn test_logs_go_to_stderr() {
    let temp_dir = setup_test_dir();

    offline(temp_dir.path())
        .args(["--verbose", "today", "--date", DAY])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("Materialized").not())
        .stderr(predicate::str::contains("Materialized 4 recurring events"));
}
