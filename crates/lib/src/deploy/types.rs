use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::runtime::{ImageRuntime, Mode};
use crate::util::hash::ArtifactId;

/// Provenance tags for resolved values.
///
/// Inference sources (`gateway env`, `staging`, ...) are free-form and come
/// from the probe that produced them.
pub mod source {
  pub const FLAG: &str = "flag";
  pub const ENV: &str = "env";
  pub const HOST: &str = "host";
  pub const STACK: &str = "stack";
  pub const DEFAULT: &str = "default";
  pub const PREVIOUS: &str = "previous";
  pub const PROMPT: &str = "prompt";
}

/// A resolved value together with where it came from.
///
/// `explicit` marks values the operator asserted (flag, typed answer, a
/// confirmed conflict prompt) as opposed to convenience defaults. Explicit
/// values win later conflict arbitration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueChoice<T = String> {
  pub value: T,
  pub source: String,
  pub explicit: bool,
}

impl<T> ValueChoice<T> {
  pub fn explicit(value: T, source: &str) -> Self {
    Self {
      value,
      source: source.to_string(),
      explicit: true,
    }
  }

  pub fn implicit(value: T, source: &str) -> Self {
    Self {
      value,
      source: source.to_string(),
      explicit: false,
    }
  }

  /// Convert the value, keeping provenance.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ValueChoice<U> {
    ValueChoice {
      value: f(self.value),
      source: self.source,
      explicit: self.explicit,
    }
  }
}

impl ValueChoice<String> {
  /// No value resolved yet.
  pub fn is_unset(&self) -> bool {
    self.value.trim().is_empty()
  }
}

/// A value observed in the running fleet (or staging) and the probe that
/// observed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
  pub value: String,
  pub source: String,
}

impl Inference {
  pub fn new(value: impl Into<String>, source: impl Into<String>) -> Self {
    Self {
      value: value.into(),
      source: source.into(),
    }
  }
}

/// A running deployment instance reconstructed from container labels.
///
/// Derived every run, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetStack {
  /// Friendly name, e.g. `esb-dev` from container `esb-dev-gateway`.
  pub name: String,
  /// Compose project label, may be empty.
  pub project: String,
  /// Env parsed from the name suffix, may be empty.
  pub env: String,
}

/// Resolved inputs for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInput {
  /// Absolute path.
  pub template_path: PathBuf,
  /// Always `<artifact root>/entries/<artifact id>`.
  pub output_dir: PathBuf,
  pub artifact_id: ArtifactId,
  pub template_sha256: String,
  pub parameters: BTreeMap<String, String>,
  /// Image URI overrides, keyed by function name.
  pub image_sources: BTreeMap<String, String>,
  pub image_runtimes: BTreeMap<String, ImageRuntime>,
}

/// Everything a deploy needs, resolved and (once returned) confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeployInputs {
  pub project_dir: PathBuf,
  pub target_stack: Option<TargetStack>,
  /// Compose project.
  pub project: ValueChoice,
  pub env: ValueChoice,
  pub mode: ValueChoice<Mode>,
  pub artifact_root: PathBuf,
  pub templates: Vec<TemplateInput>,
  /// Empty means "infer at apply time".
  pub compose_files: Vec<PathBuf>,
}

impl ResolvedDeployInputs {
  pub(crate) fn template(&self, path: &std::path::Path) -> Option<&TemplateInput> {
    self.templates.iter().find(|t| t.template_path == path)
  }
}

/// Operator-supplied flags for a deploy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployRequest {
  pub templates: Vec<String>,
  pub env: Option<String>,
  pub mode: Option<String>,
  pub project: Option<String>,
  pub compose_files: Vec<String>,
  /// Artifact root override.
  pub output: Option<String>,
  /// Manifest path override.
  pub manifest: Option<String>,
  /// `function=uri` pairs.
  pub image_uris: Vec<String>,
  /// `function=runtime` pairs.
  pub image_runtimes: Vec<String>,
  pub no_save: bool,
  pub force: bool,
  /// Require a bundle manifest in every entry.
  pub bundle: bool,
}
