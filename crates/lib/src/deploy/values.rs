//! Source-priority chains for the compose project, environment, runtime mode
//! and artifact root.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Axis, DeployError, Inference, TargetStack, ValueChoice, reconcile, source};
use crate::artifact::{default_artifact_root, normalize_artifact_root};
use crate::consts::{APP_NAME, DEFAULT_ENV, ENV_CLI_CMD, ENV_PROJECT_NAME, HOST_SUFFIX_PROJECT};
use crate::env::HostEnv;
use crate::interaction::{Prompter, Reporter};
use crate::runtime::Mode;

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// Project the operator asserted: `--project`, then `ESB_PROJECT_NAME`, then
/// the host `_PROJECT` variable.
pub fn explicit_project(flag: Option<&str>, host: &HostEnv) -> Option<ValueChoice> {
  if let Some(value) = non_blank(flag) {
    return Some(ValueChoice::explicit(value.to_string(), source::FLAG));
  }
  if let Some(value) = host.get(ENV_PROJECT_NAME) {
    return Some(ValueChoice::explicit(value.to_string(), source::ENV));
  }
  host
    .host(HOST_SUFFIX_PROJECT)
    .map(|value| ValueChoice::explicit(value.to_string(), source::HOST))
}

/// `<prefix>-<env>`, lower-cased; the prefix is `CLI_CMD` or the app name.
pub fn default_project_name(host: &HostEnv, env: &str) -> String {
  let prefix = host.get(ENV_CLI_CMD).unwrap_or(APP_NAME).to_lowercase();
  let env = env.trim().to_lowercase();
  let env = if env.is_empty() { DEFAULT_ENV.to_string() } else { env };
  format!("{}-{}", prefix, env)
}

/// Compose project: explicit value, then the selected stack's project, then
/// a default derived from the best env known so far.
pub fn resolve_project(
  explicit: Option<ValueChoice>,
  stack: Option<&TargetStack>,
  flag_env: Option<&str>,
  previous_env: &str,
  host: &HostEnv,
) -> Result<ValueChoice, DeployError> {
  if let Some(choice) = explicit {
    return Ok(choice);
  }
  if let Some(stack) = stack
    && !stack.project.trim().is_empty()
  {
    return Ok(ValueChoice::implicit(stack.project.trim().to_string(), source::STACK));
  }
  let env = non_blank(flag_env)
    .or_else(|| stack.and_then(|s| non_blank(Some(s.env.as_str()))))
    .unwrap_or(previous_env);
  let name = default_project_name(host, env);
  if name.trim().is_empty() {
    return Err(DeployError::ComposeProjectRequired);
  }
  Ok(ValueChoice::implicit(name, source::DEFAULT))
}

/// Re-derive a defaulted project from the final environment.
pub fn project_for_env(project: ValueChoice, env: &str, host: &HostEnv) -> ValueChoice {
  if project.source != source::DEFAULT || env.trim().is_empty() {
    return project;
  }
  ValueChoice::implicit(default_project_name(host, env), source::DEFAULT)
}

/// Environment: `--env`, then the selected stack, then runtime inference,
/// then a prompt. Without a prompter an unresolved env is an error.
pub fn resolve_env(
  flag: Option<&str>,
  stack: Option<&TargetStack>,
  inferred: Option<&Inference>,
  prompter: Option<&dyn Prompter>,
  previous: &str,
) -> Result<ValueChoice, DeployError> {
  if let Some(value) = non_blank(flag) {
    return Ok(ValueChoice::explicit(value.to_string(), source::FLAG));
  }
  if let Some(stack) = stack
    && let Some(env) = non_blank(Some(stack.env.as_str()))
  {
    return Ok(ValueChoice::implicit(env.to_string(), source::STACK));
  }
  if let Some(inferred) = inferred
    && let Some(env) = non_blank(Some(inferred.value.as_str()))
  {
    return Ok(ValueChoice::implicit(env.to_string(), &inferred.source));
  }
  prompt_env(prompter, previous)
}

/// Ask for the environment, defaulting to `previous` or `default`.
pub fn prompt_env(prompter: Option<&dyn Prompter>, previous: &str) -> Result<ValueChoice, DeployError> {
  let Some(prompter) = prompter else {
    return Err(DeployError::EnvironmentRequired);
  };
  let default = non_blank(Some(previous)).unwrap_or(DEFAULT_ENV).to_string();
  let answer = prompter
    .input(&format!("Environment name (default: {})", default), std::slice::from_ref(&default))
    .map_err(DeployError::prompt("environment"))?;
  let answer = answer.trim();
  if answer.is_empty() {
    return Ok(ValueChoice::implicit(default, source::DEFAULT));
  }
  Ok(ValueChoice::explicit(answer.to_string(), source::PROMPT))
}

/// Runtime mode.
///
/// A `--mode` flag is reconciled with the mode the running project uses.
/// Without a flag the inferred mode is taken, and without either the
/// operator picks one.
pub fn resolve_mode(
  flag: Option<&str>,
  inferred: Option<&Inference>,
  force: bool,
  prompter: Option<&dyn Prompter>,
  previous: &str,
  reporter: &dyn Reporter,
) -> Result<ValueChoice<Mode>, DeployError> {
  if let Some(raw) = non_blank(flag) {
    let mode: Mode = raw.parse()?;
    let choice = ValueChoice::explicit(mode.as_str().to_string(), source::FLAG);
    let reconciled = reconcile(Axis::Mode, choice, inferred, force, prompter, reporter)?;
    let mode: Mode = reconciled.value.parse()?;
    return Ok(reconciled.map(|_| mode));
  }
  if let Some(inferred) = inferred
    && let Ok(mode) = inferred.value.parse::<Mode>()
  {
    return Ok(ValueChoice::implicit(mode, &inferred.source));
  }
  prompt_mode(prompter, previous, reporter)
}

/// Ask for the runtime mode, `previous` (or docker) listed first.
pub fn prompt_mode(
  prompter: Option<&dyn Prompter>,
  previous: &str,
  reporter: &dyn Reporter,
) -> Result<ValueChoice<Mode>, DeployError> {
  let Some(prompter) = prompter else {
    return Err(DeployError::ModeRequired);
  };
  let default = previous.parse::<Mode>().unwrap_or(Mode::Docker);
  let mut options = vec![default.as_str().to_string()];
  options.extend(Mode::ALL.iter().filter(|m| **m != default).map(|m| m.as_str().to_string()));
  let title = format!("Runtime mode (default: {})", default);
  loop {
    let selected = prompter.select(&title, &options).map_err(DeployError::prompt("runtime mode"))?;
    if selected.trim().is_empty() {
      reporter.warn("Runtime mode is required.");
      continue;
    }
    let mode: Mode = selected.parse()?;
    return Ok(ValueChoice::explicit(mode, source::PROMPT));
  }
}

/// Artifact root: `--output` wins; otherwise `previous` (or the project/env
/// default) is the default answer.
pub fn resolve_artifact_root(
  flag: Option<&str>,
  prompter: Option<&dyn Prompter>,
  previous: Option<&Path>,
  project_dir: &Path,
  project: &str,
  env: &str,
  host: &HostEnv,
) -> Result<PathBuf, DeployError> {
  if let Some(value) = non_blank(flag) {
    return Ok(normalize_artifact_root(value, project_dir, host));
  }
  let default = match previous {
    Some(prev) if !prev.as_os_str().is_empty() => prev.to_path_buf(),
    _ => default_artifact_root(project_dir, project, env),
  };
  let default_str = default.display().to_string();
  let Some(prompter) = prompter else {
    return Ok(normalize_artifact_root(&default_str, project_dir, host));
  };
  let answer = prompter
    .input(
      &format!("Artifact root directory (default: {})", default_str),
      std::slice::from_ref(&default_str),
    )
    .map_err(DeployError::prompt("artifact root directory"))?;
  let answer = answer.trim();
  let chosen = if answer.is_empty() { default_str.as_str() } else { answer };
  let root = normalize_artifact_root(chosen, project_dir, host);
  debug!(root = %root.display(), "artifact root");
  Ok(root)
}
