//! Container client backed by the `docker` command line.
//!
//! `docker ps --format '{{json .}}'` prints one JSON object per line with
//! comma-joined `Names` and `Labels`; `docker inspect` prints a JSON array.

use std::collections::BTreeMap;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use super::{ClientFactory, ContainerClient, ContainerDetails, ContainerError, ContainerFilter, ContainerSummary, Mount};

/// Factory producing [`DockerCli`] clients for a given binary.
#[derive(Debug, Clone)]
pub struct DockerCliFactory {
  program: String,
}

impl DockerCliFactory {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into() }
  }
}

impl Default for DockerCliFactory {
  fn default() -> Self {
    Self::new("docker")
  }
}

impl ClientFactory for DockerCliFactory {
  fn connect(&self) -> Result<Box<dyn ContainerClient + '_>, ContainerError> {
    Ok(Box::new(DockerCli {
      program: self.program.clone(),
    }))
  }
}

/// Runs `docker` subcommands and decodes their JSON output.
#[derive(Debug, Clone)]
pub struct DockerCli {
  program: String,
}

impl DockerCli {
  fn run(&self, args: &[String]) -> Result<String, ContainerError> {
    debug!(program = %self.program, args = ?args, "querying container runtime");
    let output = Command::new(&self.program)
      .args(args)
      .output()
      .map_err(|source| ContainerError::Spawn {
        program: self.program.clone(),
        source,
      })?;

    if !output.status.success() {
      return Err(ContainerError::CommandFailed {
        command: format!("{} {}", self.program, args.first().map(String::as_str).unwrap_or("")),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}

impl ContainerClient for DockerCli {
  fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerSummary>, ContainerError> {
    let stdout = self.run(&ps_args(filter))?;
    parse_ps_output(&stdout)
  }

  fn inspect_container(&self, id: &str) -> Result<ContainerDetails, ContainerError> {
    let stdout = self.run(&["inspect".to_string(), id.to_string()])?;
    parse_inspect_output(id, &stdout)
  }
}

fn ps_args(filter: &ContainerFilter) -> Vec<String> {
  let mut args = vec![
    "ps".to_string(),
    "--no-trunc".to_string(),
    "--format".to_string(),
    "{{json .}}".to_string(),
  ];
  if filter.all {
    args.push("--all".to_string());
  }
  for (key, value) in &filter.labels {
    args.push("--filter".to_string());
    args.push(format!("label={}={}", key, value));
  }
  args
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsLine {
  #[serde(rename = "ID", default)]
  id: String,
  #[serde(default)]
  names: String,
  #[serde(default)]
  labels: String,
  #[serde(default)]
  state: String,
}

fn parse_ps_output(stdout: &str) -> Result<Vec<ContainerSummary>, ContainerError> {
  let mut out = Vec::new();
  for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
    let parsed: PsLine = serde_json::from_str(line).map_err(|source| ContainerError::Decode {
      what: "docker ps output".to_string(),
      source,
    })?;
    out.push(ContainerSummary {
      id: parsed.id,
      names: split_list(&parsed.names),
      labels: parse_labels(&parsed.labels),
      state: parsed.state,
    });
  }
  Ok(out)
}

fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Parse `k1=v1,k2=v2`. Values may themselves contain commas (compose
/// `config_files` does), so a segment without `=` continues the previous value.
fn parse_labels(raw: &str) -> BTreeMap<String, String> {
  let mut labels = BTreeMap::new();
  let mut last_key: Option<String> = None;
  for segment in raw.split(',') {
    match segment.split_once('=') {
      Some((key, value)) if !key.trim().is_empty() => {
        let key = key.trim().to_string();
        labels.insert(key.clone(), value.to_string());
        last_key = Some(key);
      }
      _ => {
        if let Some(key) = &last_key
          && let Some(value) = labels.get_mut(key)
        {
          value.push(',');
          value.push_str(segment);
        }
      }
    }
  }
  labels
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
  #[serde(default)]
  config: InspectConfig,
  #[serde(default)]
  mounts: Vec<InspectMount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
  #[serde(default)]
  env: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectMount {
  #[serde(rename = "Type", default)]
  kind: String,
  #[serde(default)]
  source: String,
  #[serde(default)]
  destination: String,
}

fn parse_inspect_output(id: &str, stdout: &str) -> Result<ContainerDetails, ContainerError> {
  let entries: Vec<InspectEntry> = serde_json::from_str(stdout).map_err(|source| ContainerError::Decode {
    what: "docker inspect output".to_string(),
    source,
  })?;
  let entry = entries
    .into_iter()
    .next()
    .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
  Ok(ContainerDetails {
    env: entry.config.env.unwrap_or_default(),
    mounts: entry
      .mounts
      .into_iter()
      .map(|m| Mount {
        kind: m.kind,
        source: m.source,
        destination: m.destination,
      })
      .collect(),
  })
}
