//! The artifact manifest data model and its YAML file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ManifestError;
use crate::util::hash::hash_directory;

/// Only schema version written and accepted.
pub const ARTIFACT_SCHEMA_VERSION: &str = "1";

/// Runtime config directory, relative to an entry's artifact root.
pub const RUNTIME_CONFIG_DIR: &str = "config";

/// Bundle manifest location, relative to an entry's artifact root.
pub const BUNDLE_MANIFEST_PATH: &str = "bundle/manifest.json";

/// Directory holding runtime hooks, relative to the project root.
pub const RUNTIME_HOOKS_DIR: &str = "runtime-hooks";

const RUNTIME_HOOKS_API_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
  pub schema_version: String,
  pub project: String,
  pub env: String,
  pub mode: String,
  /// RFC 3339, UTC.
  pub generated_at: String,
  pub generator: ArtifactGenerator,
  #[serde(default)]
  pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactGenerator {
  pub name: String,
  pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  /// Relative to the manifest's directory.
  pub artifact_root: String,
  /// Relative to `artifact_root`.
  pub runtime_config_dir: String,
  /// Relative to `artifact_root`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bundle_manifest: Option<String>,
  pub source_template: SourceTemplate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runtime_meta: Option<RuntimeMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTemplate {
  /// Relative to the project root when inside it.
  pub path: String,
  pub sha256: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeMeta {
  pub runtime_hooks: RuntimeHooksMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeHooksMeta {
  pub api_version: String,
  pub digest: String,
}

/// Format a timestamp the way `generated_at` records it.
pub fn format_generated_at(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Digest of `<project>/runtime-hooks`, or `None` when the project has none.
pub fn runtime_meta(project_dir: &Path) -> Result<Option<RuntimeMeta>, ManifestError> {
  let hooks = project_dir.join(RUNTIME_HOOKS_DIR);
  if !hooks.is_dir() {
    return Ok(None);
  }
  let digest = hash_directory(&hooks).map_err(|source| ManifestError::Hash {
    what: format!("runtime hooks {}", hooks.display()),
    source,
  })?;
  Ok(Some(RuntimeMeta {
    runtime_hooks: RuntimeHooksMeta {
      api_version: RUNTIME_HOOKS_API_VERSION.to_string(),
      digest: digest.0,
    },
  }))
}

fn check_relative(field: &str, value: &str) -> Result<(), ManifestError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(ManifestError::Invalid(format!("{} is required", field)));
  }
  let path = Path::new(trimmed);
  if path.is_absolute() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
    return Err(ManifestError::Invalid(format!("{} must be relative: {}", field, trimmed)));
  }
  if path.components().any(|c| matches!(c, Component::ParentDir)) || trimmed.split(['/', '\\']).any(|s| s == "..") {
    return Err(ManifestError::Invalid(format!(
      "{} must not traverse upward: {}",
      field, trimmed
    )));
  }
  Ok(())
}

impl ArtifactManifest {
  /// Structural checks applied before writing and after reading.
  ///
  /// `artifact_root` may point above the manifest directory (the default
  /// layout keeps manifests under `.esb/`), so it is only required to be
  /// relative.
  pub fn validate(&self) -> Result<(), ManifestError> {
    if self.schema_version.trim() != ARTIFACT_SCHEMA_VERSION {
      return Err(ManifestError::Invalid(format!(
        "unsupported schema_version {:?} (expected {:?})",
        self.schema_version, ARTIFACT_SCHEMA_VERSION
      )));
    }
    for (field, value) in [("project", &self.project), ("env", &self.env), ("mode", &self.mode)] {
      if value.trim().is_empty() {
        return Err(ManifestError::Invalid(format!("{} is required", field)));
      }
    }
    for (i, entry) in self.artifacts.iter().enumerate() {
      let root = entry.artifact_root.trim();
      if root.is_empty() {
        return Err(ManifestError::Invalid(format!("artifacts[{}].artifact_root is required", i)));
      }
      if Path::new(root).is_absolute() || root.starts_with('/') {
        return Err(ManifestError::Invalid(format!(
          "artifacts[{}].artifact_root must be relative: {}",
          i, root
        )));
      }
      check_relative(&format!("artifacts[{}].runtime_config_dir", i), &entry.runtime_config_dir)?;
      if let Some(bundle) = &entry.bundle_manifest {
        check_relative(&format!("artifacts[{}].bundle_manifest", i), bundle)?;
      }
      if entry.source_template.sha256.trim().is_empty() {
        return Err(ManifestError::Invalid(format!(
          "artifacts[{}].source_template.sha256 is required",
          i
        )));
      }
    }
    Ok(())
  }

  /// Absolute artifact root of an entry, given where the manifest lives.
  pub fn entry_root(&self, manifest_path: &Path, index: usize) -> Option<PathBuf> {
    let entry = self.artifacts.get(index)?;
    let dir = manifest_path.parent()?;
    Some(crate::util::path::clean(&dir.join(&entry.artifact_root)))
  }

  /// Validate and write atomically (temp file, then rename).
  pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
    self.validate()?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| ManifestError::Io {
      op: "create manifest directory",
      path: dir.to_path_buf(),
      source,
    })?;

    let content = serde_yaml::to_string(self).map_err(ManifestError::Serialize)?;
    let temp_path = path.with_extension("yml.tmp");
    fs::write(&temp_path, content).map_err(|source| ManifestError::Io {
      op: "write manifest",
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| ManifestError::Io {
      op: "write manifest",
      path: path.to_path_buf(),
      source,
    })?;
    info!(path = %path.display(), entries = self.artifacts.len(), "wrote artifact manifest");
    Ok(())
  }

  /// Read and validate a manifest file.
  pub fn read(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
      op: if source.kind() == io::ErrorKind::NotFound {
        "find manifest"
      } else {
        "read manifest"
      },
      path: path.to_path_buf(),
      source,
    })?;
    let manifest: ArtifactManifest = serde_yaml::from_str(&content).map_err(|source| ManifestError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    manifest.validate()?;
    debug!(path = %path.display(), "read artifact manifest");
    Ok(manifest)
  }
}
