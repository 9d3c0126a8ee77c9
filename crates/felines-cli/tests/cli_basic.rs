//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home directory,
//! so config writes never touch the real one.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_felines-cli"))
        .args(args)
        .env("HOME", home.path())
        .env("FELINES_ENV", "dev")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

#[test]
fn test_catalog_breeds_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["catalog", "breeds", "--json"]);
    assert_eq!(code, 0, "catalog breeds failed");
    let breeds: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(breeds.as_array().map(Vec::len), Some(4));
}

#[test]
fn test_catalog_unknown_breed_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["catalog", "breeds", "--name", "Gryphon"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown breed"));
}

#[test]
fn test_fact_offline() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["fact", "--offline"]);
    assert_eq!(code, 0, "offline fact failed");
    let events = json_lines(&stdout);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "ContentFetched");
    assert!(!events[0]["text"].as_str().unwrap_or_default().is_empty());
}

#[test]
fn test_simulate_reaches_milestone() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["simulate", "5", "--seed", "7"]);
    assert_eq!(code, 0, "simulate failed");

    let events = json_lines(&stdout);
    let count = |kind: &str| events.iter().filter(|e| e["type"] == kind).count();
    assert_eq!(count("Liked"), 5);
    assert_eq!(count("CuePlayed"), 5);
    assert_eq!(count("MilestoneReached"), 1);
    assert_eq!(count("NotificationShown"), 1);
    assert_eq!(count("NotificationHidden"), 1);
}

#[test]
fn test_simulate_without_audio_still_counts() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["simulate", "3", "--no-audio"]);
    assert_eq!(code, 0);

    let events = json_lines(&stdout);
    assert_eq!(events.iter().filter(|e| e["type"] == "Liked").count(), 3);
    assert_eq!(events.iter().filter(|e| e["type"] == "CueUnavailable").count(), 3);
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "engagement.milestone_interval", "3"]);
    assert_eq!(code, 0, "config set failed");
    let (stdout, _, code) = run_cli(&home, &["config", "get", "engagement.milestone_interval"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_config_rejects_zero_interval() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "engagement.milestone_interval", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    assert!(stdout.contains("milestone_interval"));
}

#[test]
fn test_session_prints_automatic_hide() {
    let home = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_felines-cli"))
        .args(["session", "--offline", "--seed", "1"])
        .env("HOME", home.path())
        .env("FELINES_ENV", "dev")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start session");

    let mut stdin = child.stdin.take().unwrap();
    writeln!(stdin, "like 5").unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(Duration::from_millis(3_600));
    writeln!(stdin, "quit").unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let events = json_lines(&String::from_utf8_lossy(&output.stdout));
    let count = |kind: &str| events.iter().filter(|e| e["type"] == kind).count();
    assert_eq!(count("NotificationShown"), 1);
    assert_eq!(count("NotificationHidden"), 1);
    let hidden = events.iter().find(|e| e["type"] == "NotificationHidden").unwrap();
    assert_eq!(hidden["reason"], "expired");
}

#[test]
fn test_unreadable_config_is_reported_not_replaced() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".config").join("felines-dev");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    let original = b"[audio]\nvolume = 0.9\n# caf\xE9\n".to_vec();
    std::fs::write(&path, &original).unwrap();

    let (stdout, stderr, code) = run_cli(&home, &["config", "get", "audio.volume"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Failed to load configuration"));
    assert_eq!(std::fs::read(&path).unwrap(), original);
}
