//! Runtime backend (mode) normalization and inference.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{CONTAINERD_SERVICE, DOCKER_SERVICE};

/// Container runtime backend a stack runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Docker,
  Containerd,
}

impl Mode {
  pub const ALL: [Mode; 2] = [Mode::Docker, Mode::Containerd];

  pub fn as_str(self) -> &'static str {
    match self {
      Mode::Docker => "docker",
      Mode::Containerd => "containerd",
    }
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported mode '{0}' (use docker or containerd)")]
pub struct UnsupportedMode(pub String);

impl FromStr for Mode {
  type Err = UnsupportedMode;

  /// Case-insensitive, surrounding whitespace ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "docker" => Ok(Mode::Docker),
      "containerd" => Ok(Mode::Containerd),
      _ => Err(UnsupportedMode(s.to_string())),
    }
  }
}

/// Service name and state of one container, the minimum needed for inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
  pub service: String,
  pub state: String,
}

/// Infer the mode from compose service names.
///
/// A `runtime-node` service means containerd and wins over an `agent`
/// service (docker) when both are present.
pub fn infer_mode_from_services(services: &[ServiceState], running_only: bool) -> Option<Mode> {
  let mut has_runtime_node = false;
  let mut has_agent = false;
  for svc in services {
    if running_only && !svc.state.eq_ignore_ascii_case("running") {
      continue;
    }
    match svc.service.trim() {
      CONTAINERD_SERVICE => has_runtime_node = true,
      DOCKER_SERVICE => has_agent = true,
      _ => {}
    }
  }
  if has_runtime_node {
    Some(Mode::Containerd)
  } else if has_agent {
    Some(Mode::Docker)
  } else {
    None
  }
}

/// Infer the mode from compose file names (`docker-compose.containerd.yml`, ...).
pub fn infer_mode_from_compose_files<P: AsRef<Path>>(files: &[P]) -> Option<Mode> {
  let names: Vec<String> = files
    .iter()
    .filter_map(|f| f.as_ref().file_name())
    .map(|n| n.to_string_lossy().to_ascii_lowercase())
    .collect();
  if names.iter().any(|n| n.contains("containerd")) {
    return Some(Mode::Containerd);
  }
  if names.iter().any(|n| n.contains("docker")) {
    return Some(Mode::Docker);
  }
  None
}
