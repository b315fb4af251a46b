//! Snapshot of the process environment.
//!
//! Resolution code never calls `std::env::var` directly. The CLI captures the
//! environment once with [`HostEnv::from_process`] and passes it down; tests
//! build one from a literal map.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::consts::ENV_PREFIX;
use crate::util::path;

/// Immutable view over environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
  vars: BTreeMap<String, String>,
  /// Platform home directory, used when `HOME` is not set.
  home: Option<PathBuf>,
}

impl HostEnv {
  /// Capture the current process environment.
  ///
  /// Variables whose name or value is not valid Unicode are skipped.
  pub fn from_process() -> Self {
    let mut vars = BTreeMap::new();
    for (key, value) in std::env::vars_os() {
      match (key.into_string(), value.into_string()) {
        (Ok(key), Ok(value)) => {
          vars.insert(key, value);
        }
        (Ok(key), Err(_)) => debug!(key = %key, "skipping non-unicode environment value"),
        (Err(key), _) => debug!(key = %key.to_string_lossy(), "skipping non-unicode environment name"),
      }
    }
    Self {
      vars,
      home: dirs::home_dir(),
    }
  }

  /// Build from explicit key/value pairs.
  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
      home: None,
    }
  }

  /// The user's home directory: `HOME`, then the platform default captured
  /// by [`HostEnv::from_process`].
  pub fn home_dir(&self) -> Option<PathBuf> {
    self.get("HOME").map(PathBuf::from).or_else(|| self.home.clone())
  }

  /// Expand a leading `~` against [`HostEnv::home_dir`].
  pub fn expand_home(&self, value: &str) -> PathBuf {
    path::expand_home(value, self.home_dir().as_deref())
  }

  /// Look up a variable, treating blank values as unset.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
  }

  /// Name of a host-level variable (`<ENV_PREFIX>_<suffix>`).
  ///
  /// Returns `None` when `ENV_PREFIX` is unset.
  pub fn host_key(&self, suffix: &str) -> Option<String> {
    self.get(ENV_PREFIX).map(|prefix| format!("{}_{}", prefix, suffix))
  }

  /// Look up a host-level variable (`<ENV_PREFIX>_<suffix>`).
  pub fn host(&self, suffix: &str) -> Option<&str> {
    let key = self.host_key(suffix)?;
    self.get(&key)
  }
}
