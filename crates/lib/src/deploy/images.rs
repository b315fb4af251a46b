//! Per-function image sources and runtimes.

use std::collections::BTreeMap;

use super::DeployError;
use crate::interaction::{Prompter, Reporter};
use crate::runtime::ImageRuntime;
use crate::template::ImageFunction;

pub const IMAGE_URI_FLAG: &str = "--image-uri";
pub const IMAGE_RUNTIME_FLAG: &str = "--image-runtime";

/// Parse repeated `<function>=<value>` flags. Later entries win.
pub fn parse_overrides(values: &[String], flag: &'static str) -> Result<BTreeMap<String, String>, DeployError> {
  let mut out = BTreeMap::new();
  for raw in values {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      continue;
    }
    let invalid = || DeployError::InvalidOverride {
      flag,
      raw: raw.clone(),
    };
    let (key, value) = trimmed.split_once('=').ok_or_else(invalid)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
      return Err(invalid());
    }
    out.insert(key.to_string(), value.to_string());
  }
  Ok(out)
}

/// Overrides that name one of `functions`.
pub fn filter_overrides(overrides: &BTreeMap<String, String>, functions: &[ImageFunction]) -> BTreeMap<String, String> {
  functions
    .iter()
    .filter_map(|f| overrides.get(&f.name).map(|v| (f.name.clone(), v.clone())))
    .collect()
}

/// Image sources to record: an override, else the previous choice.
///
/// Functions falling back to the template's own URI are left out.
pub fn resolve_image_sources(
  functions: &[ImageFunction],
  overrides: &BTreeMap<String, String>,
  previous: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
  let mut out = BTreeMap::new();
  for function in functions {
    let chosen = overrides
      .get(&function.name)
      .or_else(|| previous.get(&function.name))
      .map(|v| v.trim())
      .filter(|v| !v.is_empty());
    if let Some(value) = chosen {
      out.insert(function.name.clone(), value.to_string());
    }
  }
  out
}

fn effective_source<'a>(function: &'a ImageFunction, sources: &'a BTreeMap<String, String>) -> &'a str {
  let source = sources
    .get(&function.name)
    .map(String::as_str)
    .unwrap_or(function.image_source.as_str())
    .trim();
  if source.is_empty() { "<unknown>" } else { source }
}

/// Runtime for every image function.
///
/// An explicit override is validated and used as is, even interactively.
/// Otherwise the previous runtime (or python) is the default, offered first
/// in a select when a prompter is available.
pub fn resolve_image_runtimes(
  functions: &[ImageFunction],
  sources: &BTreeMap<String, String>,
  overrides: &BTreeMap<String, String>,
  previous: &BTreeMap<String, String>,
  prompter: Option<&dyn Prompter>,
  reporter: &dyn Reporter,
) -> Result<BTreeMap<String, ImageRuntime>, DeployError> {
  let mut out = BTreeMap::new();
  for function in functions {
    let name = &function.name;
    let invalid = |source| DeployError::InvalidImageRuntime {
      function: name.clone(),
      source,
    };

    if let Some(raw) = overrides.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
      out.insert(name.clone(), raw.parse::<ImageRuntime>().map_err(invalid)?);
      continue;
    }

    let prev = previous.get(name).map(|v| v.trim()).unwrap_or_default();
    let default = prev.parse::<ImageRuntime>().unwrap_or_else(|e| {
      reporter.warn(&format!(
        "Ignoring previous runtime \"{}\" for image function {}: {}",
        prev, name, e
      ));
      ImageRuntime::default()
    });

    let Some(prompter) = prompter else {
      out.insert(name.clone(), default);
      continue;
    };

    let title = format!(
      "Runtime for image function {} (image: {}, default: {})",
      name,
      effective_source(function, sources),
      default.choice()
    );
    let options: Vec<String> = ImageRuntime::ordered_choices(default)
      .into_iter()
      .map(str::to_string)
      .collect();
    let selected = prompter
      .select(&title, &options)
      .map_err(DeployError::prompt(format!("image runtime for {}", name)))?;
    let selected = selected.trim();
    let runtime = if selected.is_empty() {
      default
    } else {
      selected.parse::<ImageRuntime>().map_err(invalid)?
    };
    out.insert(name.clone(), runtime);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{RecordingReporter, ScriptedPrompter};

  fn function(name: &str, image: &str) -> ImageFunction {
    ImageFunction {
      logical_id: name.to_string(),
      name: name.to_string(),
      image_source: image.to_string(),
    }
  }

  fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
  }

  mod overrides {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_blanks() {
      let parsed = parse_overrides(&strings(&[" a = x ", "", "b=y=z", "a=w"]), IMAGE_URI_FLAG).unwrap();
      assert_eq!(parsed, map(&[("a", "w"), ("b", "y=z")]));
    }

    #[test]
    fn rejects_malformed_entries() {
      for raw in ["novalue", "=x", "k=", " = "] {
        let err = parse_overrides(&strings(&[raw]), IMAGE_RUNTIME_FLAG).unwrap_err();
        assert!(
          err.to_string().starts_with("--image-runtime must be in <function>=<value> format"),
          "{raw:?}: {err}"
        );
      }
    }

    #[test]
    fn filter_keeps_known_functions() {
      let functions = vec![function("a", "img/a"), function("b", "img/b")];
      let filtered = filter_overrides(&map(&[("a", "1"), ("zzz", "2")]), &functions);
      assert_eq!(filtered, map(&[("a", "1")]));
    }
  }

  mod sources {
    use super::*;

    #[test]
    fn override_then_previous() {
      let functions = vec![function("a", "img/a"), function("b", "img/b"), function("c", "img/c")];
      let sources = resolve_image_sources(
        &functions,
        &map(&[("a", "reg/a:2")]),
        &map(&[("a", "reg/a:1"), ("b", "reg/b:1")]),
      );
      assert_eq!(sources, map(&[("a", "reg/a:2"), ("b", "reg/b:1")]));
    }
  }

  mod runtimes {
    use super::*;

    #[test]
    fn non_interactive_uses_previous_or_python() {
      let functions = vec![function("a", "img/a"), function("b", "img/b")];
      let reporter = RecordingReporter::default();
      let runtimes = resolve_image_runtimes(
        &functions,
        &BTreeMap::new(),
        &BTreeMap::new(),
        &map(&[("a", "java21")]),
        None,
        &reporter,
      )
      .unwrap();
      assert_eq!(runtimes["a"], ImageRuntime::Java21);
      assert_eq!(runtimes["b"], ImageRuntime::Python312);
    }

    #[test]
    fn invalid_previous_warns_and_defaults() {
      let functions = vec![function("a", "img/a")];
      let reporter = RecordingReporter::default();
      let runtimes = resolve_image_runtimes(
        &functions,
        &BTreeMap::new(),
        &BTreeMap::new(),
        &map(&[("a", "ruby")]),
        None,
        &reporter,
      )
      .unwrap();
      assert_eq!(runtimes["a"], ImageRuntime::Python312);
      assert_eq!(reporter.messages().len(), 1);
      assert!(reporter.messages()[0].starts_with("Ignoring previous runtime \"ruby\" for image function a"));
    }

    #[test]
    fn invalid_override_fails_without_prompting() {
      let functions = vec![function("a", "img/a")];
      let prompter = ScriptedPrompter::new(["python"]);
      let reporter = RecordingReporter::default();
      let err = resolve_image_runtimes(
        &functions,
        &BTreeMap::new(),
        &map(&[("a", "node20")]),
        &BTreeMap::new(),
        Some(&prompter),
        &reporter,
      )
      .unwrap_err();
      assert!(matches!(err, DeployError::InvalidImageRuntime { ref function, .. } if function == "a"));
      assert!(prompter.calls().is_empty());
    }

    #[test]
    fn valid_override_skips_prompt() {
      let functions = vec![function("a", "img/a")];
      let prompter = ScriptedPrompter::new(Vec::<String>::new());
      let reporter = RecordingReporter::default();
      let runtimes = resolve_image_runtimes(
        &functions,
        &BTreeMap::new(),
        &map(&[("a", "JAVA21")]),
        &BTreeMap::new(),
        Some(&prompter),
        &reporter,
      )
      .unwrap();
      assert_eq!(runtimes["a"], ImageRuntime::Java21);
    }

    #[test]
    fn prompt_offers_default_first_and_shows_source() {
      let functions = vec![function("a", "img/a")];
      let prompter = ScriptedPrompter::new(["python"]);
      let reporter = RecordingReporter::default();
      let runtimes = resolve_image_runtimes(
        &functions,
        &map(&[("a", "reg/a:override")]),
        &BTreeMap::new(),
        &map(&[("a", "java21")]),
        Some(&prompter),
        &reporter,
      )
      .unwrap();
      assert_eq!(runtimes["a"], ImageRuntime::Python312);

      let calls = prompter.calls();
      assert_eq!(
        calls[0].title,
        "Runtime for image function a (image: reg/a:override, default: java21)"
      );
      assert_eq!(calls[0].choices, vec!["java21", "python"]);
    }
  }
}
