//! The project-local `config.yaml`: stored build defaults and template history.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ConfigError;
use crate::consts::{CONFIG_FILENAME, HOME_DIR, TEMPLATE_HISTORY_LIMIT};

/// Current config file version.
pub const CONFIG_VERSION: u32 = 1;

/// Contents of `<project>/.esb/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
  #[serde(default)]
  pub version: u32,
  /// Last confirmed inputs, keyed by absolute template path.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub build_defaults: BTreeMap<String, BuildDefaults>,
  /// Most recent first.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub recent_templates: Vec<String>,
}

impl Default for GlobalConfig {
  fn default() -> Self {
    Self {
      version: CONFIG_VERSION,
      build_defaults: BTreeMap::new(),
      recent_templates: Vec::new(),
    }
  }
}

/// Inputs remembered for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDefaults {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub env: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub mode: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub output_dir: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub params: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub image_sources: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub image_runtimes: BTreeMap<String, String>,
}

/// Path of the config file for a project root.
pub fn project_config_path(project_root: &Path) -> PathBuf {
  project_root.join(HOME_DIR).join(CONFIG_FILENAME)
}

impl GlobalConfig {
  /// Load a config file.
  ///
  /// Returns the default config if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    let mut config: GlobalConfig = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    if config.version == 0 {
      config.version = CONFIG_VERSION;
    }
    Ok(config)
  }

  /// Write the config, creating parent directories.
  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    let content = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    fs::write(path, content).map_err(|source| ConfigError::Write {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "saved config");
    Ok(())
  }

  /// Stored defaults for a template, empty when none were saved.
  pub fn defaults_for(&self, template_path: &str) -> BuildDefaults {
    self.build_defaults.get(template_path).cloned().unwrap_or_default()
  }

  /// Record confirmed inputs for a template and bump it in the history.
  pub fn record(&mut self, template_path: &str, defaults: BuildDefaults) {
    if template_path.trim().is_empty() {
      return;
    }
    self.build_defaults.insert(template_path.to_string(), defaults);
    self.recent_templates = update_template_history(&self.recent_templates, template_path);
  }

  /// Recent templates that still exist on disk, de-duplicated and capped.
  pub fn template_history(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in &self.recent_templates {
      let trimmed = entry.trim();
      if trimmed.is_empty() || out.iter().any(|e| e == trimmed) {
        continue;
      }
      if !Path::new(trimmed).exists() {
        continue;
      }
      out.push(trimmed.to_string());
      if out.len() >= TEMPLATE_HISTORY_LIMIT {
        break;
      }
    }
    out
  }
}

/// Create the config file with defaults if it does not exist yet.
pub fn ensure_project_config(project_root: &Path) -> Result<PathBuf, ConfigError> {
  let path = project_config_path(project_root);
  if !path.exists() {
    GlobalConfig::default().save(&path)?;
  }
  Ok(path)
}

/// Put `template_path` first, keep earlier entries after it, drop blanks and
/// duplicates, and cap the list.
pub fn update_template_history(history: &[String], template_path: &str) -> Vec<String> {
  let mut next: Vec<String> = Vec::with_capacity(TEMPLATE_HISTORY_LIMIT);
  for value in std::iter::once(template_path).chain(history.iter().map(String::as_str)) {
    let trimmed = value.trim();
    if trimmed.is_empty() || next.iter().any(|e| e == trimmed) {
      continue;
    }
    if next.len() >= TEMPLATE_HISTORY_LIMIT {
      break;
    }
    next.push(trimmed.to_string());
  }
  next
}
