mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("ttc-fusion").expect("binary built")
}

#[test]
fn default_config_prints_json() {
    cli()
        .arg("default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"frame_rate\": 10.0"))
        .stdout(predicate::str::contains("\"knn_ratio\""));
}

#[test]
fn default_config_can_be_written_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fusion.json");
    cli()
        .args(["default-config", "--out"])
        .arg(&path)
        .assert()
        .success();
    let cfg = ttc_fusion::FusionConfig::load_json(&path).unwrap();
    assert_eq!(cfg, ttc_fusion::FusionConfig::default());
}

#[test]
fn run_writes_csv_report() {
    let dir = tempfile::tempdir().unwrap();
    let recording = common::write_recording(dir.path());
    let config = dir.path().join("fusion.json");
    common::config().write_json(&config).unwrap();
    let csv_path = dir.path().join("ttc.csv");

    cli()
        .args(["--log-level", "warn", "run", "--recording"])
        .arg(&recording)
        .arg("--config")
        .arg(&config)
        .args(["--detector", "fast", "--descriptor", "brief", "--csv"])
        .arg(&csv_path)
        .assert()
        .success();

    let text = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("detector,descriptor,frame,"));
    assert!(lines[1].starts_with("FAST,BRIEF,0,,,NaN"));
    assert!(lines[2].starts_with("FAST,BRIEF,1,0,0,0.9"));
    assert!(lines[3].starts_with("FAST,BRIEF,3,0,0,"));
}

#[test]
fn run_without_output_files_prints_csv() {
    let dir = tempfile::tempdir().unwrap();
    let recording = common::write_recording(dir.path());
    let config = dir.path().join("fusion.json");
    common::config().write_json(&config).unwrap();

    cli()
        .args(["run", "--recording"])
        .arg(&recording)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("detector,descriptor,frame"))
        .stdout(predicate::str::contains("FAST,BRIEF,3,0,0"));
}

#[test]
fn missing_recording_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .args(["run", "--recording"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn detector_requires_descriptor() {
    cli()
        .args(["run", "--recording", "r.json", "--detector", "FAST"])
        .assert()
        .failure();
}

#[test]
fn log_level_installs_logger_before_running() {
    cli()
        .args(["--log-level", "debug", "default-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sweep\""));
}
