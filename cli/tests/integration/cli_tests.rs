//! Integration tests for the CLI surface: help, version, argument parsing,
//! and the failure paths that need no network or WSL.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated home, config file, and an empty `PATH` so `wsl.exe` and
/// `docker` are never found.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir(dir.path().join("bin")).expect("bin dir");
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = wslstack();
        cmd.env("HOME", self.dir.path())
            .env("WSLSTACK_CONFIG", self.dir.path().join("config.yaml"))
            .env("PATH", self.dir.path().join("bin"))
            .env_remove("WSLSTACK_LOG");
        cmd
    }
}

fn wslstack() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wslstack"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    wslstack().assert().code(2).stderr(predicate::str::contains(
        "Ubuntu on WSL with a container runtime",
    ));
}

#[test]
fn test_cli_help_lists_every_command() {
    let output = wslstack().arg("--help").output().expect("run");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["resolve", "provision", "host", "status", "config", "version"] {
        assert!(help.contains(command), "missing {command} in:\n{help}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    wslstack()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wslstack"));
}

#[test]
fn test_version_command_shows_version() {
    wslstack()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wslstack 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = wslstack()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["version"], "0.1.0");
}

#[test]
fn test_unknown_command_is_a_usage_error() {
    wslstack()
        .arg("launch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_provision_help_documents_flags() {
    wslstack()
        .args(["provision", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--release"))
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--skip-container"));
}

// --- Failure paths ---

#[test]
fn test_resolve_unknown_release_fails_before_network() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["resolve", "--release", "99.99"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown release: 99.99"));
}

#[test]
fn test_resolve_unknown_release_json_error_object() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["resolve", "--release", "99.99", "--json"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "INVALID_CONFIG");
}

#[test]
fn test_provision_without_wsl_reports_wsl_unavailable() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["provision", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wsl.exe not found"));
}

#[test]
fn test_provision_without_wsl_json_code() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["provision", "--yes", "--json"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["code"], "WSL_UNAVAILABLE");
}

#[test]
fn test_provision_rejects_invalid_distro_name() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["provision", "--name", "bad name"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value for distro.name"));
}

#[test]
fn test_host_without_docker_fails_with_context() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("host")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Docker engine not reachable"));
}

// --- Status ---

#[test]
fn test_status_without_wsl_reports_unknown() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["status", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["distro"], "wslstack");
    assert!(value["imported"].is_null());
    assert!(value["container"].is_null());
    assert!(value.get("record").is_none());
}

#[test]
fn test_status_reads_saved_record() {
    let sandbox = Sandbox::new();
    let state_dir = sandbox.dir.path().join(".wslstack");
    std::fs::create_dir_all(&state_dir).expect("state dir");
    std::fs::write(
        state_dir.join("state.json"),
        r#"{
  "distro": "wslstack",
  "artifact": {
    "version": "24.04",
    "codename": "noble",
    "rootfs_uri": "https://cloud-images.ubuntu.com/wsl/noble/current/ubuntu-noble-wsl-amd64-wsl.rootfs.tar.gz",
    "release_date": "2024-04-25"
  },
  "provisioned_at": "2026-01-02T03:04:05Z"
}"#,
    )
    .expect("state");

    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("24.04"))
        .stdout(predicate::str::contains("noble"));
}

#[test]
fn test_verbose_logging_goes_to_stderr_only() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["-vv", "status", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    serde_json::from_slice::<serde_json::Value>(&output.stdout).expect("stdout stays pure JSON");
    assert!(String::from_utf8_lossy(&output.stderr).contains("DEBUG"));
}
