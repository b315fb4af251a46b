//! CLI smoke tests for esb.
//!
//! The binary runs without a terminal (so never prompts) and with `PATH`
//! pointing at an empty directory, which makes every container probe fail
//! and only warn.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

const TEMPLATE: &str = r#"
Parameters:
  Stage:
    Type: String
    Default: dev
Resources:
  Worker:
    Type: AWS::Serverless::Function
    Properties:
      FunctionName: worker
      PackageType: Image
      ImageUri: registry.local/worker:latest
"#;

/// Get a Command for the esb binary, isolated from the caller's environment.
fn esb_cmd(dir: &Path) -> Command {
  let mut cmd = cargo_bin_cmd!("esb");
  cmd
    .current_dir(dir)
    .env("PATH", dir.join("bin"))
    .env("HOME", dir)
    .env("XDG_CACHE_HOME", dir.join(".cache"))
    .env_remove("ENV_PREFIX")
    .env_remove("ESB_PROJECT_NAME")
    .env_remove("ESB_ENV")
    .env_remove("CLI_CMD")
    .env_remove("RUST_LOG");
  cmd
}

/// A project root with a compose marker and one template under `svc/`.
fn temp_project() -> TempDir {
  let temp = TempDir::new().unwrap();
  fs::create_dir_all(temp.path().join("bin")).unwrap();
  fs::write(temp.path().join("docker-compose.docker.yml"), "services: {}\n").unwrap();
  fs::create_dir_all(temp.path().join("svc")).unwrap();
  fs::write(temp.path().join("svc/template.yaml"), TEMPLATE).unwrap();
  temp
}

fn manifest_path(temp: &TempDir) -> std::path::PathBuf {
  temp.path().join(".esb/artifacts/esb-dev/dev/artifact.yml")
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  cargo_bin_cmd!("esb")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  cargo_bin_cmd!("esb")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("esb"));
}

#[test]
fn deploy_help_lists_flags() {
  cargo_bin_cmd!("esb")
    .args(["deploy", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--template"))
    .stdout(predicate::str::contains("--image-runtime"))
    .stdout(predicate::str::contains("--no-save"));
}

#[test]
fn artifact_help_lists_show() {
  cargo_bin_cmd!("esb")
    .args(["artifact", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("show"));
}

// =============================================================================
// Deploy
// =============================================================================

#[test]
#[serial]
fn deploy_writes_manifest_without_docker() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "docker", "-t", "svc"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Artifact manifest"))
    .stderr(predicate::str::contains("failed to discover running stacks"));

  let manifest = fs::read_to_string(manifest_path(&temp)).unwrap();
  assert!(manifest.contains("project: esb-dev"));
  assert!(manifest.contains("mode: docker"));
  assert!(manifest.contains("Stage: dev"));
  assert!(temp.path().join(".esb/config.yaml").exists());
}

#[test]
#[serial]
fn deploy_no_save_skips_config() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "docker", "-t", "svc", "--no-save"])
    .assert()
    .success();

  assert!(manifest_path(&temp).exists());
  let config = fs::read_to_string(temp.path().join(".esb/config.yaml")).unwrap_or_default();
  assert!(!config.contains("svc/template.yaml"));
}

#[test]
#[serial]
fn deploy_without_env_fails() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["deploy", "--mode", "docker", "-t", "svc"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("environment is required"));
}

#[test]
#[serial]
fn deploy_with_invalid_mode_fails() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "podman", "-t", "svc"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unsupported mode"));
}

#[test]
#[serial]
fn deploy_with_missing_template_fails() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "docker", "-t", "missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("template not found"));
}

// =============================================================================
// Artifact
// =============================================================================

#[test]
#[serial]
fn artifact_show_reads_written_manifest() {
  let temp = temp_project();
  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "docker", "-t", "svc"])
    .assert()
    .success();

  esb_cmd(temp.path())
    .args(["artifact", "show", "--env", "dev"])
    .assert()
    .success()
    .stdout(predicate::str::contains("esb-dev"))
    .stdout(predicate::str::contains("svc/template.yaml"));
}

#[test]
#[serial]
fn artifact_show_json() {
  let temp = temp_project();
  esb_cmd(temp.path())
    .args(["deploy", "--env", "dev", "--mode", "docker", "-t", "svc"])
    .assert()
    .success();

  let output = esb_cmd(temp.path())
    .args(["artifact", "show", "--json"])
    .arg(manifest_path(&temp))
    .output()
    .unwrap();
  assert!(output.status.success());
  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["env"], "dev");
  assert_eq!(value["artifacts"].as_array().map(Vec::len), Some(1));
}

#[test]
#[serial]
fn artifact_show_missing_manifest_fails() {
  let temp = temp_project();

  esb_cmd(temp.path())
    .args(["artifact", "show", "--env", "dev"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load artifact manifest"));
}
