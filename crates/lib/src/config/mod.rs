//! Persisted configuration and project root discovery.
//!
//! # Storage Layout
//!
//! ```text
//! <project root>/.esb/
//! └── config.yaml    # GlobalConfig: stored build defaults + recent templates
//! ```

mod global;
mod repo;

pub use global::*;
pub use repo::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to serialize config: {0}")]
  Serialize(#[source] serde_yaml::Error),

  #[error("failed to write config {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
