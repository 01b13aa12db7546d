// vidrender-cli/tests/cli_integration.rs
//
// Exercises the binary's argument handling. Every case here fails or
// finishes before ffmpeg would be needed.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn vidrender() -> Command {
    let mut cmd = Command::cargo_bin("vidrender").unwrap();
    cmd.env_remove("VIDRENDER_WORKSPACE").env_remove("VIDRENDER_WORKERS");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    vidrender()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("filters"));
}

#[test]
fn test_filters_lists_every_filter() {
    let assert = vidrender().arg("filters").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for name in [
        "grayscale",
        "blur",
        "sepia",
        "brightness",
        "contrast",
        "saturation",
        "warm_tone",
        "cool_tone",
        "edge_detection",
    ] {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
}

#[test]
fn test_filters_json() {
    vidrender()
        .args(["filters", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[\"grayscale\",\"blur\""));
}

#[test]
fn test_process_missing_input_fails() {
    let dir = tempdir().unwrap();
    vidrender()
        .args(["process", "--filter", "sepia", "--workspace"])
        .arg(dir.path().join("ws"))
        .arg(dir.path().join("missing.mp4"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input path"));
}

#[test]
fn test_process_invalid_filter_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, b"not really a video").unwrap();

    vidrender()
        .args(["process", "--filter", "rainbow", "--workspace"])
        .arg(dir.path().join("ws"))
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter 'rainbow'"))
        .stderr(predicate::str::contains("edge_detection"));
}

#[test]
fn test_process_requires_filter() {
    let dir = tempdir().unwrap();
    vidrender()
        .arg("process")
        .arg(dir.path().join("clip.mp4"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--filter"));
}

#[test]
fn test_process_rejects_zero_workers() {
    vidrender()
        .args(["process", "clip.mp4", "--filter", "blur", "--workers", "0"])
        .assert()
        .failure();
}

#[test]
fn test_probe_missing_input_fails() {
    let dir = tempdir().unwrap();
    vidrender()
        .arg("probe")
        .arg(dir.path().join("missing.mp4"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input path"));
}

#[test]
fn test_log_dir_receives_a_log_file() {
    let dir = tempdir().unwrap();
    let logs = dir.path().join("logs");
    vidrender()
        .args(["filters", "--log-dir"])
        .arg(&logs)
        .assert()
        .success();

    let files: Vec<_> = fs::read_dir(&logs).unwrap().collect();
    assert_eq!(files.len(), 1);
}
