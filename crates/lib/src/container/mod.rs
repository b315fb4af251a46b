//! Container fleet access.
//!
//! Resolution code talks to the running fleet only through the
//! [`ClientFactory`] / [`ContainerClient`] capabilities defined here:
//!
//! - [`types`] - container summaries, inspect details and list filters
//! - [`docker`] - implementation backed by the `docker` command line

pub mod docker;
mod types;

pub use types::*;

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors raised while querying the container runtime.
#[derive(Debug, Error)]
pub enum ContainerError {
  /// The runtime binary could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The runtime command exited unsuccessfully.
  #[error("{command} failed with exit code {code:?}: {stderr}")]
  CommandFailed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The runtime produced output that could not be decoded.
  #[error("failed to decode {what}: {source}")]
  Decode {
    what: String,
    #[source]
    source: serde_json::Error,
  },

  /// Inspect returned nothing for a container ID.
  #[error("container {0} not found")]
  NotFound(String),
}

/// Read-only queries against the container runtime.
pub trait ContainerClient {
  /// List containers matching every label in `filter`.
  fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerSummary>, ContainerError>;

  /// Inspect one container for its environment and mounts.
  fn inspect_container(&self, id: &str) -> Result<ContainerDetails, ContainerError>;
}

/// Produces connected clients on demand.
///
/// Connection failure is reported per call so callers can downgrade it to a
/// warning.
pub trait ClientFactory {
  fn connect(&self) -> Result<Box<dyn ContainerClient + '_>, ContainerError>;
}

/// Convert `KEY=value` entries into a map; entries without a key are dropped.
pub fn env_list_to_map(env: &[String]) -> BTreeMap<String, String> {
  let mut out = BTreeMap::new();
  for entry in env {
    let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
    let key = key.trim();
    if key.is_empty() {
      continue;
    }
    out.insert(key.to_string(), value.to_string());
  }
  out
}
