//! Container runtime data as seen by resolution code.

use std::collections::BTreeMap;

/// Which containers a list call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
  /// Include stopped containers.
  pub all: bool,
  /// `key=value` label constraints; all must match.
  pub labels: Vec<(String, String)>,
}

impl ContainerFilter {
  /// Running containers only, no label constraints.
  pub fn running() -> Self {
    Self::default()
  }

  /// Running and stopped containers.
  pub fn all() -> Self {
    Self {
      all: true,
      labels: Vec::new(),
    }
  }

  /// Add a label constraint.
  pub fn with_label(mut self, key: &str, value: &str) -> Self {
    self.labels.push((key.to_string(), value.to_string()));
    self
  }

  /// Whether a summary satisfies this filter.
  pub fn matches(&self, container: &ContainerSummary) -> bool {
    if !self.all && !container.is_running() {
      return false;
    }
    self
      .labels
      .iter()
      .all(|(k, v)| container.labels.get(k).is_some_and(|actual| actual == v))
  }
}

/// One entry of a container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSummary {
  pub id: String,
  pub names: Vec<String>,
  pub labels: BTreeMap<String, String>,
  pub state: String,
}

impl ContainerSummary {
  pub fn is_running(&self) -> bool {
    self.state.eq_ignore_ascii_case("running")
  }

  /// First non-empty name with the leading `/` stripped.
  pub fn primary_name(&self) -> &str {
    self
      .names
      .iter()
      .map(|n| n.trim().trim_start_matches('/'))
      .find(|n| !n.is_empty())
      .unwrap_or("")
  }

  /// Trimmed label value, `None` when missing or blank.
  pub fn label(&self, key: &str) -> Option<&str> {
    self.labels.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
  }
}

/// A mount reported by inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mount {
  /// Mount type (`bind`, `volume`, ...).
  pub kind: String,
  pub source: String,
  pub destination: String,
}

/// Inspect details needed for environment inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
  /// `KEY=value` entries of the container config.
  pub env: Vec<String>,
  pub mounts: Vec<Mount>,
}
