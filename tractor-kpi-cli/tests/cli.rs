use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use twox_hash::XxHash64;

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tractor-kpi-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn event(kind: &str, version: &str, data: &Value) -> String {
    json!({
        "timestamp": "2025-07-01T10:00:00.000Z",
        "event": kind,
        "appVersion": version,
        "gameId": format!("{version}-g1"),
        "data": data,
    })
    .to_string()
}

fn game_log(version: &str) -> String {
    let plays = json!([{"playerId": "p1"}, {"playerId": "p2"}, {"playerId": "p3"}, {"playerId": "p4"}]);
    [
        event(
            "game_initialized",
            version,
            &json!({"attackingTeam": "team_1", "defendingTeam": "team_2"}),
        ),
        event("kitty_pickup", version, &json!({"kittyPoints": 15})),
        event(
            "trick_completed",
            version,
            &json!({"winningPlayer": "p2", "trickPoints": 10, "allPlays": plays}),
        ),
        "not json at all".to_string(),
        event("attacking_team_victory", version, &json!({"finalPoints": 95})),
        event("game_over", version, &json!({"winner": "team_1"})),
    ]
    .join("\n")
}

fn logs_dir(label: &str) -> PathBuf {
    let dir = temp_path(label);
    std::fs::create_dir_all(&dir).expect("create logs dir");
    std::fs::write(dir.join("run-a.log"), game_log("1.0.0")).expect("write log");
    std::fs::write(dir.join("run-b.log"), game_log("1.1.0")).expect("write log");
    std::fs::write(dir.join("README.txt"), "ignored").expect("write other file");
    dir
}

fn run(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tractor-kpi"))
        .arg("--logs-dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("run cli")
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

#[test]
fn csv_report_has_one_row_per_version() {
    let dir = logs_dir("csv");
    let output = run(&["--report", "csv"], &dir);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("build_version,total_games,attacking_team_win_rate"));
    assert!(lines[1].starts_with("1.0.0,1,1,0,"));
    assert!(lines[2].starts_with("1.1.0,1,1,0,"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn csv_output_is_repeatable() {
    let dir = logs_dir("repeat");
    let first = run(&["--report", "csv"], &dir);
    let second = run(&["--report", "csv"], &dir);
    assert!(first.status.success() && second.status.success());
    assert_eq!(snapshot_hash(&first.stdout), snapshot_hash(&second.stdout));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn json_report_written_to_file() {
    let dir = logs_dir("json");
    let output_path = temp_path("report.json");
    let output = Command::new(env!("CARGO_BIN_EXE_tractor-kpi"))
        .arg("--logs-dir")
        .arg(&dir)
        .args(["--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Report written to"));

    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(value["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["rows"][0]["kitty_events"], 1);
    assert_eq!(value["rows"][0]["positions"]["2"]["win_rate"], 1.0);
    assert_eq!(value["quality"]["malformed_lines"], 2);
    let _ = std::fs::remove_dir_all(dir);
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn markdown_report_lists_versions() {
    let dir = logs_dir("markdown");
    let output = run(&["--report", "markdown"], &dir);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# 🎮 Tractor AI Performance Report"));
    assert!(stdout.contains("**Total Games:** 2"));
    assert!(stdout.contains("## 📊 App Version: `1.0.0`"));
    assert!(stdout.contains("## 📊 App Version: `1.1.0`"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn stamp_rewrites_logs_before_analysis() {
    let dir = logs_dir("stamp");
    let output = run(&["--stamp", "--report", "csv"], &dir);
    assert!(output.status.success());
    let stamped = std::fs::read_to_string(dir.join("run-a.log")).expect("read stamped log");
    let lines: Vec<_> = stamped.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("\"sequenceNumber\":1"));
    assert!(lines[4].contains("\"sequenceNumber\":5"));
    assert_eq!(
        std::fs::read_to_string(dir.join("README.txt")).expect("read other file"),
        "ignored"
    );
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_logs_dir_fails() {
    let output = run(&["--report", "csv"], &temp_path("absent"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read logs directory"));
}

#[test]
fn directory_without_events_fails() {
    let dir = temp_path("empty");
    std::fs::create_dir_all(&dir).expect("create dir");
    std::fs::write(dir.join("noise.log"), "\nnot json\n").expect("write log");
    let output = run(&["--report", "csv"], &dir);
    assert!(!output.status.success());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn rejects_unknown_report_format() {
    let dir = temp_path("format");
    let output = run(&["--report", "xml"], &dir);
    assert!(!output.status.success());
}
