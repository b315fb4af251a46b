//! Artifact IDs and the paths derived from them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ManifestError;
use crate::consts::{ARTIFACT_MANIFEST_FILENAME, DEFAULT_ENV, HOME_DIR};
use crate::util::hash::{ArtifactId, Hashable, hash_file};
use crate::env::HostEnv;
use crate::util::path::{absolutize, clean, relative_to, to_slash};

const ARTIFACTS_DIR: &str = "artifacts";
const ENTRIES_DIR: &str = "entries";

/// The inputs an artifact ID is computed over.
///
/// Parameters are a `BTreeMap`, so the serialized form (and the ID) does not
/// depend on insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactIdentity<'a> {
  pub template_path: &'a str,
  pub parameters: &'a BTreeMap<String, String>,
  pub template_sha256: &'a str,
}

impl Hashable for ArtifactIdentity<'_> {}

/// ID for a normalized template path, its parameters and its file digest.
pub fn compute_artifact_id(
  template_path: &str,
  parameters: &BTreeMap<String, String>,
  template_sha256: &str,
) -> Result<ArtifactId, ManifestError> {
  ArtifactIdentity {
    template_path,
    parameters,
    template_sha256,
  }
  .compute_id()
  .map_err(ManifestError::Identity)
}

/// SHA-256 of a template file.
pub fn template_sha256(path: &Path) -> Result<String, ManifestError> {
  hash_file(path).map(|h| h.0).map_err(|source| ManifestError::Hash {
    what: format!("template {}", path.display()),
    source,
  })
}

/// Hash the template and compute its ID.
///
/// Returns the ID together with the template digest.
pub fn derive_artifact_id(
  project_dir: &Path,
  template_path: &Path,
  parameters: &BTreeMap<String, String>,
) -> Result<(ArtifactId, String), ManifestError> {
  let sha = template_sha256(template_path)?;
  let source_path = normalize_source_template_path(project_dir, template_path);
  let id = compute_artifact_id(&source_path, parameters, &sha)?;
  Ok((id, sha))
}

/// Template path as recorded in manifests: relative to the project root with
/// forward slashes, or the cleaned absolute path when outside it.
pub fn normalize_source_template_path(project_dir: &Path, template_path: &Path) -> String {
  let template = clean(template_path);
  let project = clean(project_dir);
  if template.is_absolute()
    && project.is_absolute()
    && let Some(rel) = relative_to(&project, &template)
    && !rel.starts_with("..")
  {
    return to_slash(&rel);
  }
  to_slash(&template)
}

/// Make a path segment safe to join under a directory.
///
/// Separators become `-`; blank, `.` and `..` become `default`.
pub fn sanitize_path_segment(value: &str) -> String {
  let replaced = value.trim().replace(['/', '\\'], "-");
  let trimmed = replaced.trim();
  if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
    return DEFAULT_ENV.to_string();
  }
  trimmed.to_string()
}

/// `<project>/artifacts/<project>-<env>`, without repeating an env suffix the
/// project name already carries.
pub fn default_artifact_root(project_dir: &Path, project: &str, env: &str) -> PathBuf {
  let project = sanitize_path_segment(project);
  let env = sanitize_path_segment(env);
  let suffix = format!("-{}", env);
  let scope = if project.ends_with(&suffix) {
    project
  } else {
    format!("{}{}", project, suffix)
  };
  project_dir.join(ARTIFACTS_DIR).join(scope)
}

/// Resolve an operator-supplied artifact root against the project root.
pub fn normalize_artifact_root(value: &str, project_dir: &Path, host: &HostEnv) -> PathBuf {
  absolutize(&host.expand_home(value.trim()), project_dir)
}

/// Output directory of one entry: `<root>/entries/<id>`.
pub fn entry_output_dir(artifact_root: &Path, id: &ArtifactId) -> PathBuf {
  artifact_root.join(ENTRIES_DIR).join(&id.0)
}

/// Artifact root an entry output directory belongs to, if it follows the
/// `<root>/entries/<id>` layout.
pub fn artifact_root_of(output_dir: &Path) -> Option<PathBuf> {
  let entries = output_dir.parent()?;
  if entries.file_name()? != ENTRIES_DIR {
    return None;
  }
  entries.parent().map(Path::to_path_buf)
}

/// Default manifest location for a project/env pair.
pub fn default_manifest_path(project_dir: &Path, project: &str, env: &str) -> PathBuf {
  project_dir
    .join(HOME_DIR)
    .join(ARTIFACTS_DIR)
    .join(sanitize_path_segment(project))
    .join(sanitize_path_segment(env))
    .join(ARTIFACT_MANIFEST_FILENAME)
}
