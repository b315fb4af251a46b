//! Function template inspection.
//!
//! Deploy resolution needs two things from a SAM-style template: its declared
//! parameters and the functions packaged as container images. Both come
//! through the [`TemplateParser`] capability so resolution code can be tested
//! with in-memory templates.

mod intrinsics;
mod sam;

pub use intrinsics::substitute;
pub use sam::SamTemplateParser;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("failed to read template {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to decode template {path}: {source}")]
  Decode {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("template {path} is not a YAML mapping")]
  NotAMapping { path: PathBuf },

  #[error("image function {function} ({logical_id}) requires {field}")]
  ImageUriRequired {
    function: String,
    logical_id: String,
    field: &'static str,
  },

  #[error("image function {function} ({logical_id}) has unresolved {field}: {uri}")]
  UnresolvedImageUri {
    function: String,
    logical_id: String,
    field: &'static str,
    uri: String,
  },
}

/// A declared template parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParameter {
  pub name: String,
  /// CloudFormation type (`String`, `Number`, ...).
  pub kind: String,
  pub description: String,
  pub default: Option<String>,
  /// `AllowedValues`, de-duplicated in declaration order.
  pub allowed: Vec<String>,
}

impl TemplateParameter {
  /// A plain `String` with no enumeration (or one listing `""`) may be empty.
  pub fn allows_empty(&self) -> bool {
    if !self.kind.trim().eq_ignore_ascii_case("String") {
      return false;
    }
    self.allowed.is_empty() || self.allowed.iter().any(|v| v.trim().is_empty())
  }

  /// Check `value` against `allowed`, naming the permitted set on failure.
  pub fn check_allowed(&self, value: &str) -> Result<(), String> {
    if self.allowed.is_empty() || self.allowed.iter().any(|v| v == value) {
      return Ok(());
    }
    let shown: Vec<&str> = self
      .allowed
      .iter()
      .map(|v| if v.trim().is_empty() { "''" } else { v.as_str() })
      .collect();
    Err(format!("parameter \"{}\" must be one of [{}]", self.name, shown.join(", ")))
  }
}

/// A function packaged as a container image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFunction {
  pub logical_id: String,
  /// `FunctionName` when set, otherwise the logical ID.
  pub name: String,
  /// Image URI declared by the template, intrinsics resolved.
  pub image_source: String,
}

/// Template inspection capability.
pub trait TemplateParser {
  /// Declared parameters keyed by name.
  fn parameters(&self, path: &Path) -> Result<BTreeMap<String, TemplateParameter>, TemplateError>;

  /// Image functions sorted by name, with `values` (over declared defaults)
  /// substituted into intrinsics.
  fn image_functions(&self, path: &Path, values: &BTreeMap<String, String>) -> Result<Vec<ImageFunction>, TemplateError>;
}
