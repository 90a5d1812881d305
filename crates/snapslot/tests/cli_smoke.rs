//! CLI smoke tests.
//!
//! Contract guarantees tested:
//! - `check` validates offline and prints the tiers
//! - Config errors exit 1 with remediation on stderr
//! - The token never appears in output
//! - Unreachable API endpoints fail cleanly

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TOKEN: &str = "dop_v1_secret_token_value";

/// Write `contents` to `snapslot.toml` in a fresh temp dir.
fn write_config(contents: &str) -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("snapslot.toml");
    std::fs::write(&path, contents).expect("write config");
    let path = path.to_string_lossy().to_string();
    (dir, path)
}

/// `snapslot` with the ambient SNAPSLOT_* environment cleared.
fn snapslot() -> Command {
    let mut cmd = Command::cargo_bin("snapslot").expect("binary built");
    for var in [
        "SNAPSLOT_CONFIG",
        "SNAPSLOT_TOKEN",
        "SNAPSLOT_VOLUME",
        "SNAPSLOT_PREFIX",
        "SNAPSLOT_API_URL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn full_config() -> String {
    format!(
        "[provider]\ntoken = \"{TOKEN}\"\n\n[backup]\nvolume = \"volume-fra1-01\"\n"
    )
}

#[test]
fn help_lists_subcommands() {
    snapslot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn check_prints_default_tiers() {
    let (_dir, path) = write_config(&full_config());

    snapslot()
        .args(["--config", &path, "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("volume-fra1-01"))
        .stdout(predicate::str::contains("tier 0: younger than 18h, keeps the newest"))
        .stdout(predicate::str::contains("tier 3: younger than 14days, keeps the oldest"))
        .stdout(predicate::str::contains(TOKEN).not());
}

#[test]
fn check_json_is_parseable() {
    let (_dir, path) = write_config(&full_config());

    let output = snapslot()
        .args(["--config", &path, "--format", "json", "check"])
        .output()
        .expect("run snapslot");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["volume"], "volume-fra1-01");
    assert_eq!(report["prefix"], "auto-");
    assert_eq!(report["token_set"], true);
    assert_eq!(report["tiers"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["tiers"][1]["max_age"], "2days");
}

#[test]
fn flags_override_file_values() {
    let (_dir, path) = write_config(&full_config());

    snapslot()
        .args(["--config", &path, "--volume", "other-vol", "--prefix", "nightly-", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("other-vol"))
        .stdout(predicate::str::contains("\"nightly-\""));
}

#[test]
fn check_without_token_fails_with_remediation() {
    let (_dir, path) = write_config("[backup]\nvolume = \"data\"\n");

    snapslot()
        .args(["--config", &path, "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("token"))
        .stderr(predicate::str::contains("To fix:"));
}

#[test]
fn token_from_environment_is_accepted() {
    let (_dir, path) = write_config("[backup]\nvolume = \"data\"\n");

    snapslot()
        .env("SNAPSLOT_TOKEN", TOKEN)
        .args(["--config", &path, "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains(TOKEN).not());
}

#[test]
fn invalid_thresholds_fail_to_parse() {
    let (_dir, path) = write_config(
        "[provider]\ntoken = \"t\"\n[backup]\nvolume = \"data\"\nthresholds = [\"7days\", \"2days\"]\n",
    );

    snapslot()
        .args(["--config", &path, "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strictly increasing"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("absent.toml");

    snapslot()
        .args(["--config", path.to_str().expect("utf-8 path"), "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn plan_against_unreachable_api_fails() {
    let (_dir, path) = write_config(&full_config());

    snapslot()
        .args([
            "--config",
            &path,
            "--api-url",
            "http://127.0.0.1:1/v2/",
            "--log-level",
            "error",
            "plan",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Transport failure"));
}
