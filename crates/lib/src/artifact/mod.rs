//! Artifact identity and the `artifact.yml` manifest.
//!
//! Every rendered template instance gets a content-addressed [`ArtifactId`]
//! and lives at `<artifact root>/entries/<id>`. One deploy invocation records
//! all of its entries in a single manifest:
//!
//! ```text
//! <project>/.esb/artifacts/<project>/<env>/artifact.yml
//! ```
//!
//! [`ArtifactId`]: crate::util::hash::ArtifactId

mod identity;
mod manifest;

pub use identity::*;
pub use manifest::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::util::hash::DirHashError;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to {op} {path}: {source}")]
  Io {
    op: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize artifact manifest: {0}")]
  Serialize(#[source] serde_yaml::Error),

  #[error("failed to parse artifact manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("invalid artifact manifest: {0}")]
  Invalid(String),

  #[error("failed to hash {what}: {source}")]
  Hash {
    what: String,
    #[source]
    source: DirHashError,
  },

  #[error("failed to compute artifact id: {0}")]
  Identity(#[source] serde_json::Error),
}
