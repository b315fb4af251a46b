use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::ManifestError;
use crate::config::ConfigError;
use crate::interaction::PromptError;
use crate::runtime::{UnsupportedImageRuntime, UnsupportedMode};
use crate::template::TemplateError;

/// Configuration axis a conflict was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
  Environment,
  Mode,
}

impl Axis {
  /// Short noun used in prompt options (`env`, `mode`).
  pub fn short(self) -> &'static str {
    match self {
      Axis::Environment => "env",
      Axis::Mode => "mode",
    }
  }

  /// Prompt title prefix.
  pub fn title(self) -> &'static str {
    match self {
      Axis::Environment => "Environment",
      Axis::Mode => "Runtime mode",
    }
  }

  /// What the observed value was read from.
  pub fn observer(self) -> &'static str {
    match self {
      Axis::Environment => "gateway",
      Axis::Mode => "project",
    }
  }

  /// Flag that bypasses the conflict.
  pub fn flag(self) -> &'static str {
    "--force"
  }
}

impl fmt::Display for Axis {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Axis::Environment => f.write_str("environment"),
      Axis::Mode => f.write_str("runtime mode"),
    }
  }
}

#[derive(Debug, Error)]
pub enum DeployError {
  #[error("environment is required (use --env)")]
  EnvironmentRequired,

  #[error("mode is required (use --mode)")]
  ModeRequired,

  #[error("compose project is required (use --project)")]
  ComposeProjectRequired,

  #[error("template path is required (use --template)")]
  TemplatePathRequired,

  #[error("parameter \"{0}\" requires a value (declare a Default or deploy interactively)")]
  ParameterRequired(String),

  #[error("template not found: {0}")]
  TemplateNotFound(PathBuf),

  #[error(
    "{axis} mismatch: running {} uses \"{inferred}\" ({inferred_source}), deploy uses \"{current}\" ({current_source}) (use {} to override)",
    .axis.observer(),
    .axis.flag()
  )]
  Mismatch {
    axis: Axis,
    current: String,
    current_source: String,
    inferred: String,
    inferred_source: String,
  },

  #[error("multiple running stacks found: {} (use --project)", .0.join(", "))]
  MultipleRunningStacks(Vec<String>),

  #[error("invalid mode: {0}")]
  InvalidMode(#[from] UnsupportedMode),

  #[error("invalid image runtime for {function}: {source}")]
  InvalidImageRuntime {
    function: String,
    #[source]
    source: UnsupportedImageRuntime,
  },

  #[error("{flag} must be in <function>=<value> format: {raw:?}")]
  InvalidOverride { flag: &'static str, raw: String },

  #[error("{0}")]
  ParameterNotAllowed(String),

  #[error("bundle manifest not found: {0}")]
  BundleManifestMissing(PathBuf),

  #[error("failed to {op} {path}: {source}")]
  Io {
    op: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to prompt for {what}: {source}")]
  Prompt {
    what: String,
    #[source]
    source: PromptError,
  },

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

impl DeployError {
  pub(crate) fn prompt(what: impl Into<String>) -> impl FnOnce(PromptError) -> DeployError {
    let what = what.into();
    move |source| DeployError::Prompt { what, source }
  }
}
