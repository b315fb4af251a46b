//! Runtimes selectable for image-backed functions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime an image function is wrapped with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImageRuntime {
  #[default]
  #[serde(rename = "python3.12")]
  Python312,
  #[serde(rename = "java21")]
  Java21,
}

impl ImageRuntime {
  /// Full runtime identifier, as persisted and passed to the build.
  pub fn as_str(self) -> &'static str {
    match self {
      ImageRuntime::Python312 => "python3.12",
      ImageRuntime::Java21 => "java21",
    }
  }

  /// Short label offered in prompts and summaries.
  pub fn choice(self) -> &'static str {
    match self {
      ImageRuntime::Python312 => "python",
      ImageRuntime::Java21 => "java21",
    }
  }

  /// Prompt choices with `first` leading.
  pub fn ordered_choices(first: ImageRuntime) -> Vec<&'static str> {
    let mut out = vec![first.choice()];
    for runtime in [ImageRuntime::Python312, ImageRuntime::Java21] {
      if runtime != first {
        out.push(runtime.choice());
      }
    }
    out
  }
}

impl fmt::Display for ImageRuntime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported runtime '{0}' (use python or java21)")]
pub struct UnsupportedImageRuntime(pub String);

impl FromStr for ImageRuntime {
  type Err = UnsupportedImageRuntime;

  /// Accepts both the short choice (`python`) and the full identifier.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "" | "python" | "python3.12" => Ok(ImageRuntime::Python312),
      "java21" => Ok(ImageRuntime::Java21),
      _ => Err(UnsupportedImageRuntime(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn python_aliases_normalize_to_default_version() {
    for raw in ["", "python", "PYTHON", "python3.12"] {
      assert_eq!(raw.parse::<ImageRuntime>().unwrap(), ImageRuntime::Python312, "{raw:?}");
    }
  }

  #[test]
  fn java_runtime_parses() {
    assert_eq!(" Java21 ".parse::<ImageRuntime>().unwrap(), ImageRuntime::Java21);
  }

  #[test]
  fn other_versions_are_rejected() {
    assert!("python3.9".parse::<ImageRuntime>().is_err());
    assert!("java17".parse::<ImageRuntime>().is_err());
  }

  #[test]
  fn ordered_choices_put_default_first() {
    assert_eq!(ImageRuntime::ordered_choices(ImageRuntime::Java21), vec!["java21", "python"]);
    assert_eq!(ImageRuntime::ordered_choices(ImageRuntime::Python312), vec!["python", "java21"]);
  }

  #[test]
  fn serializes_full_identifier() {
    assert_eq!(serde_json::to_string(&ImageRuntime::Python312).unwrap(), "\"python3.12\"");
  }
}
