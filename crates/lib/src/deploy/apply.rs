//! Turning confirmed inputs into artifact directories and the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{DeployError, ResolvedDeployInputs, TemplateInput};
use crate::artifact::{
  ARTIFACT_SCHEMA_VERSION, ArtifactEntry, ArtifactGenerator, ArtifactManifest, BUNDLE_MANIFEST_PATH, RUNTIME_CONFIG_DIR,
  RuntimeMeta, SourceTemplate, default_manifest_path, format_generated_at, normalize_source_template_path, runtime_meta,
};
use crate::consts::APP_NAME;
use crate::env::HostEnv;
use crate::util::path::{absolutize, clean, relative_to, to_slash};

/// Where the manifest for `inputs` goes: `override_path` (relative to the
/// project root) or the project/env default.
pub fn manifest_path(inputs: &ResolvedDeployInputs, override_path: Option<&str>, host: &HostEnv) -> PathBuf {
  match override_path.map(str::trim).filter(|v| !v.is_empty()) {
    Some(value) => absolutize(&host.expand_home(value), &inputs.project_dir),
    None => default_manifest_path(&inputs.project_dir, &inputs.project.value, &inputs.env.value),
  }
}

fn entry_for(
  template: &TemplateInput,
  project_dir: &Path,
  manifest_dir: &Path,
  bundle: bool,
  meta: &Option<RuntimeMeta>,
) -> Result<ArtifactEntry, DeployError> {
  let output_dir = clean(&template.output_dir);
  let artifact_root = relative_to(manifest_dir, &output_dir)
    .map(|rel| to_slash(&rel))
    .unwrap_or_else(|| to_slash(&output_dir));

  let bundle_path = output_dir.join(BUNDLE_MANIFEST_PATH);
  let bundle_manifest = if bundle_path.is_file() {
    Some(BUNDLE_MANIFEST_PATH.to_string())
  } else if bundle {
    return Err(DeployError::BundleManifestMissing(bundle_path));
  } else {
    None
  };

  Ok(ArtifactEntry {
    id: template.artifact_id.0.clone(),
    artifact_root,
    runtime_config_dir: RUNTIME_CONFIG_DIR.to_string(),
    bundle_manifest,
    source_template: SourceTemplate {
      path: normalize_source_template_path(project_dir, &template.template_path),
      sha256: template.template_sha256.clone(),
      parameters: template.parameters.clone(),
    },
    runtime_meta: meta.clone(),
  })
}

/// Assemble the manifest for `inputs`, to be stored at `path`.
///
/// Entries follow template order. With `bundle` set, every entry must
/// already hold a bundle manifest.
pub fn build_artifact_manifest(
  inputs: &ResolvedDeployInputs,
  path: &Path,
  bundle: bool,
  generated_at: DateTime<Utc>,
) -> Result<ArtifactManifest, DeployError> {
  let manifest_dir = clean(path.parent().unwrap_or_else(|| Path::new(".")));
  let meta = runtime_meta(&inputs.project_dir)?;
  let artifacts = inputs
    .templates
    .iter()
    .map(|t| entry_for(t, &inputs.project_dir, &manifest_dir, bundle, &meta))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(ArtifactManifest {
    schema_version: ARTIFACT_SCHEMA_VERSION.to_string(),
    project: inputs.project.value.clone(),
    env: inputs.env.value.clone(),
    mode: inputs.mode.value.as_str().to_string(),
    generated_at: format_generated_at(generated_at),
    generator: ArtifactGenerator {
      name: APP_NAME.to_string(),
      version: env!("CARGO_PKG_VERSION").to_string(),
    },
    artifacts,
  })
}

/// Build the manifest, create each entry's output and runtime config
/// directories, then write the manifest. Returns the manifest path.
///
/// Nothing is created when an entry fails validation.
pub fn write_artifact_manifest(
  inputs: &ResolvedDeployInputs,
  override_path: Option<&str>,
  bundle: bool,
  host: &HostEnv,
) -> Result<PathBuf, DeployError> {
  let path = manifest_path(inputs, override_path, host);
  let manifest = build_artifact_manifest(inputs, &path, bundle, Utc::now())?;
  manifest.validate()?;

  for template in &inputs.templates {
    let config_dir = template.output_dir.join(RUNTIME_CONFIG_DIR);
    fs::create_dir_all(&config_dir).map_err(|source| DeployError::Io {
      op: "create artifact directory",
      path: config_dir.clone(),
      source,
    })?;
    debug!(id = %template.artifact_id, dir = %template.output_dir.display(), "prepared artifact entry");
  }

  manifest.write(&path)?;
  info!(path = %path.display(), project = %manifest.project, env = %manifest.env, "artifact manifest ready");
  Ok(path)
}
