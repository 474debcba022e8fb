//! CLI integration tests.
//!
//! These run the `galileo` binary with config and data directories pointed
//! at a temporary directory. None of them need a datalogger.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_galileo(home: &Path, args: &[&str]) -> Output {
    run_galileo_with_no_color(home, "1", args)
}

fn run_galileo_with_no_color(home: &Path, no_color: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_galileo"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", no_color)
        .env_remove("GALILEO_PORT")
        .output()
        .expect("failed to run galileo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let output = run_galileo(home.path(), &["--help"]);
    assert!(output.status.success());

    let text = stdout(&output);
    for command in ["download", "history", "equipment", "ports", "config"] {
        assert!(text.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_equipment_single_profile() {
    let home = TempDir::new().unwrap();
    let output = run_galileo(home.path(), &["equipment", "FREEZER"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("FREEZER\n"));
    assert!(text.contains("<= -17.0 °C"));
}

#[test]
fn test_no_color_env_values_accepted() {
    let home = TempDir::new().unwrap();
    for value in ["1", "0", "", "yes", "anything"] {
        let output = run_galileo_with_no_color(home.path(), value, &["equipment", "FREEZER"]);
        assert!(output.status.success(), "NO_COLOR={value:?} should be accepted");
    }
}

#[test]
fn test_equipment_unknown_fails() {
    let home = TempDir::new().unwrap();
    let output = run_galileo(home.path(), &["equipment", "CAMARA"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown equipment"));
}

#[test]
fn test_download_rejects_blank_port() {
    let home = TempDir::new().unwrap();
    let output = run_galileo(home.path(), &["--quiet", "download", "--port", "", "--no-save"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to download from"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().unwrap();

    let output = run_galileo(home.path(), &["config", "set", "baud", "19200"]);
    assert!(output.status.success());
    assert!(home.path().join("config/galileo/config.toml").is_file());

    let output = run_galileo(home.path(), &["config", "show"]);
    assert!(stdout(&output).contains("baud = 19200"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_history_list_empty() {
    let home = TempDir::new().unwrap();
    let output = run_galileo(home.path(), &["history", "list", "--format", "json"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "[]");
    assert!(home.path().join("data/galileo/historial_lecturas").is_dir());
}
