//! Template path normalization and selection.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::DeployError;
use crate::consts::{HOME_DIR, TEMPLATE_FILENAMES};
use crate::env::HostEnv;
use crate::interaction::{Prompter, Reporter};
use crate::util::path::absolutize;

/// Select option that switches to free-form input.
pub const MANUAL_OPTION: &str = "Enter path...";

const SKIPPED_DIRS: &[&str] = &[".git", HOME_DIR, "node_modules", ".venv", "__pycache__", ".pytest_cache", ".mypy_cache"];

fn template_in_dir(dir: &Path) -> Option<PathBuf> {
  TEMPLATE_FILENAMES.iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

/// Absolute path of the template file `value` refers to.
///
/// `~` is expanded; a relative path is tried against `cwd`, then the project
/// root; a directory resolves to the template file inside it.
pub fn normalize_template_path(
  value: &str,
  cwd: &Path,
  project_dir: &Path,
  host: &HostEnv,
) -> Result<PathBuf, DeployError> {
  let value = value.trim();
  if value.is_empty() {
    return Err(DeployError::TemplatePathRequired);
  }
  let expanded = host.expand_home(value);
  let mut candidate = absolutize(&expanded, cwd);
  if !candidate.exists() && expanded.is_relative() {
    let alt = absolutize(&expanded, project_dir);
    if alt.exists() {
      candidate = alt;
    }
  }
  if !candidate.exists() {
    return Err(DeployError::TemplateNotFound(candidate));
  }
  if !candidate.is_dir() {
    return Ok(candidate);
  }
  template_in_dir(&candidate).ok_or(DeployError::TemplateNotFound(candidate))
}

/// Sub-directories of `dir` holding a template file, sorted.
pub fn discover_candidates(dir: &Path) -> Vec<String> {
  let Ok(entries) = fs::read_dir(dir) else {
    return Vec::new();
  };
  let mut out: Vec<String> = entries
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
    .map(|e| e.file_name().to_string_lossy().to_string())
    .filter(|name| !SKIPPED_DIRS.contains(&name.as_str()))
    .filter(|name| template_in_dir(&dir.join(name)).is_some())
    .collect();
  out.sort();
  out
}

/// Previous template, then history, then candidates, without duplicates.
pub fn build_suggestions(previous: Option<&str>, history: &[String], candidates: &[String]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  let all = previous.into_iter().chain(history.iter().map(String::as_str)).chain(candidates.iter().map(String::as_str));
  for value in all {
    let value = value.trim();
    if !value.is_empty() && !out.iter().any(|v| v == value) {
      out.push(value.to_string());
    }
  }
  out
}

/// Where template selection happens and what it can suggest.
pub struct TemplateSearch<'a> {
  pub cwd: &'a Path,
  pub project_dir: &'a Path,
  pub host: &'a HostEnv,
  /// Template of the previous pass.
  pub previous: Option<&'a Path>,
  /// Recent templates that still exist.
  pub history: &'a [String],
}

impl TemplateSearch<'_> {
  fn normalize(&self, value: &str) -> Result<PathBuf, DeployError> {
    normalize_template_path(value, self.cwd, self.project_dir, self.host)
  }

  fn fallback(&self, candidates: &[String]) -> Result<PathBuf, DeployError> {
    if let Some(prev) = self.previous {
      return self.normalize(&prev.display().to_string());
    }
    match candidates.first() {
      Some(first) => self.normalize(first),
      None => self.normalize("."),
    }
  }

  fn from_input(&self, input: &str, default: Option<&str>, candidates: &[String]) -> Result<PathBuf, DeployError> {
    let input = input.trim();
    if !input.is_empty() {
      return self.normalize(input);
    }
    match default {
      Some(default) => self.normalize(default),
      None => self.fallback(candidates).map_err(|_| DeployError::TemplatePathRequired),
    }
  }

  fn ask(&self, prompter: &dyn Prompter) -> Result<Result<PathBuf, DeployError>, DeployError> {
    let candidates = discover_candidates(self.cwd);
    let previous = self.previous.map(|p| p.display().to_string());
    let suggestions = build_suggestions(previous.as_deref(), self.history, &candidates);
    let default = suggestions.first().map(String::as_str);
    let title = match default {
      Some(default) => format!("Template path (default: {})", default),
      None => "Template path".to_string(),
    };

    if !suggestions.is_empty() {
      let mut options = suggestions.clone();
      options.push(MANUAL_OPTION.to_string());
      let selected = prompter
        .select(&title, &options)
        .map_err(DeployError::prompt("template selection"))?;
      if selected != MANUAL_OPTION {
        return Ok(self.normalize(&selected));
      }
    }
    let input = prompter
      .input(&title, &suggestions)
      .map_err(DeployError::prompt("template path"))?;
    Ok(self.from_input(&input, default, &candidates))
  }

  /// Normalize `values`, or ask for one template when there are none.
  pub fn resolve(
    &self,
    values: &[String],
    prompter: Option<&dyn Prompter>,
    reporter: &dyn Reporter,
  ) -> Result<Vec<PathBuf>, DeployError> {
    let values: Vec<&str> = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()).collect();
    if !values.is_empty() {
      return values.into_iter().map(|v| self.normalize(v)).collect();
    }
    let Some(prompter) = prompter else {
      return Err(DeployError::TemplatePathRequired);
    };
    loop {
      match self.ask(prompter)? {
        Ok(path) => {
          debug!(template = %path.display(), "selected template");
          return Ok(vec![path]);
        }
        Err(DeployError::TemplatePathRequired) => reporter.warn("Template path is required."),
        Err(e) => reporter.warn(&format!("Invalid template path: {}", e)),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{RecordingReporter, ScriptedPrompter};
  use tempfile::TempDir;

  fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "Resources: {}\n").unwrap();
  }

  mod normalize {
    use super::*;

    #[test]
    fn directory_resolves_to_template_file() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("svc/template.yml"));
      let path = normalize_template_path("svc", temp.path(), temp.path(), &HostEnv::default()).unwrap();
      assert_eq!(path, temp.path().join("svc/template.yml"));
    }

    #[test]
    fn falls_back_to_project_root() {
      let temp = TempDir::new().unwrap();
      let cwd = temp.path().join("sub");
      fs::create_dir_all(&cwd).unwrap();
      touch(&temp.path().join("svc/template.yaml"));
      let path = normalize_template_path("svc/template.yaml", &cwd, temp.path(), &HostEnv::default()).unwrap();
      assert_eq!(path, temp.path().join("svc/template.yaml"));
    }

    #[test]
    fn tilde_expands_from_host_home() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("svc/template.yaml"));
      let home = temp.path().display().to_string();
      let host = HostEnv::from_pairs([("HOME", home.as_str())]);
      let other = TempDir::new().unwrap();
      let path = normalize_template_path("~/svc", other.path(), other.path(), &host).unwrap();
      assert_eq!(path, temp.path().join("svc/template.yaml"));
    }

    #[test]
    fn missing_and_empty_dirs_are_errors() {
      let temp = TempDir::new().unwrap();
      fs::create_dir_all(temp.path().join("empty")).unwrap();
      assert!(matches!(
        normalize_template_path("missing.yaml", temp.path(), temp.path(), &HostEnv::default()),
        Err(DeployError::TemplateNotFound(_))
      ));
      assert!(matches!(
        normalize_template_path("empty", temp.path(), temp.path(), &HostEnv::default()),
        Err(DeployError::TemplateNotFound(_))
      ));
      assert!(matches!(
        normalize_template_path(" ", temp.path(), temp.path(), &HostEnv::default()),
        Err(DeployError::TemplatePathRequired)
      ));
    }
  }

  mod discovery {
    use super::*;

    #[test]
    fn lists_template_dirs_sorted() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("b/template.yaml"));
      touch(&temp.path().join("a/template.yml"));
      touch(&temp.path().join(".esb/template.yaml"));
      fs::create_dir_all(temp.path().join("c")).unwrap();
      assert_eq!(discover_candidates(temp.path()), vec!["a", "b"]);
    }

    #[test]
    fn suggestions_are_unique_and_ordered() {
      let history = vec!["/h/1".to_string(), "/p/prev".to_string()];
      let candidates = vec!["a".to_string()];
      assert_eq!(
        build_suggestions(Some("/p/prev"), &history, &candidates),
        vec!["/p/prev", "/h/1", "a"]
      );
    }
  }

  mod selection {
    use super::*;

    #[test]
    fn flags_are_normalized_in_order() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("b/template.yaml"));
      touch(&temp.path().join("a/template.yaml"));
      let host = HostEnv::default();
      let search = TemplateSearch {
        cwd: temp.path(),
        project_dir: temp.path(),
        host: &host,
        previous: None,
        history: &[],
      };
      let reporter = RecordingReporter::default();
      let paths = search.resolve(&["b".to_string(), " ".to_string(), "a".to_string()], None, &reporter).unwrap();
      assert_eq!(paths, vec![temp.path().join("b/template.yaml"), temp.path().join("a/template.yaml")]);
    }

    #[test]
    fn required_without_prompter() {
      let temp = TempDir::new().unwrap();
      let host = HostEnv::default();
      let search = TemplateSearch {
        cwd: temp.path(),
        project_dir: temp.path(),
        host: &host,
        previous: None,
        history: &[],
      };
      let reporter = RecordingReporter::default();
      assert!(matches!(
        search.resolve(&[], None, &reporter),
        Err(DeployError::TemplatePathRequired)
      ));
    }

    #[test]
    fn select_candidate() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("svc/template.yaml"));
      let host = HostEnv::default();
      let search = TemplateSearch {
        cwd: temp.path(),
        project_dir: temp.path(),
        host: &host,
        previous: None,
        history: &[],
      };
      let prompter = ScriptedPrompter::new(["svc"]);
      let reporter = RecordingReporter::default();
      let paths = search.resolve(&[], Some(&prompter), &reporter).unwrap();
      assert_eq!(paths, vec![temp.path().join("svc/template.yaml")]);

      let calls = prompter.calls();
      assert_eq!(calls[0].title, "Template path (default: svc)");
      assert_eq!(calls[0].choices, vec!["svc", MANUAL_OPTION]);
    }

    #[test]
    fn manual_input_retries_invalid_paths() {
      let temp = TempDir::new().unwrap();
      touch(&temp.path().join("svc/template.yaml"));
      let host = HostEnv::default();
      let search = TemplateSearch {
        cwd: temp.path(),
        project_dir: temp.path(),
        host: &host,
        previous: None,
        history: &[],
      };
      let prompter = ScriptedPrompter::new([MANUAL_OPTION, "nope", MANUAL_OPTION, ""]);
      let reporter = RecordingReporter::default();
      let paths = search.resolve(&[], Some(&prompter), &reporter).unwrap();
      assert_eq!(paths, vec![temp.path().join("svc/template.yaml")]);

      let messages = reporter.messages();
      assert_eq!(messages.len(), 1);
      assert!(messages[0].starts_with("Invalid template path: template not found"));
    }

    #[test]
    fn no_suggestions_asks_for_input() {
      let temp = TempDir::new().unwrap();
      let host = HostEnv::default();
      let search = TemplateSearch {
        cwd: temp.path(),
        project_dir: temp.path(),
        host: &host,
        previous: None,
        history: &[],
      };
      let prompter = ScriptedPrompter::new(["", "also-missing"]);
      let reporter = RecordingReporter::default();
      let result = search.resolve(&[], Some(&prompter), &reporter);
      // Both answers are rejected, then the script runs out.
      assert!(matches!(result, Err(DeployError::Prompt { .. })));
      let messages = reporter.messages();
      assert_eq!(messages[0], "Template path is required.");
      assert!(messages[1].starts_with("Invalid template path"));
    }
  }
}
