//! Template parameter values.

use std::collections::BTreeMap;

use super::DeployError;
use crate::interaction::{Prompter, Reporter};
use crate::template::TemplateParameter;

fn push_unique(out: &mut Vec<String>, value: &str) {
  let value = value.trim();
  if !value.is_empty() && !out.iter().any(|v| v == value) {
    out.push(value.to_string());
  }
}

/// Title reflecting what an empty answer falls back to.
fn prompt_title(param: &TemplateParameter, previous: &str) -> String {
  let label = if param.description.trim().is_empty() {
    param.name.clone()
  } else {
    format!("{} ({})", param.name, param.description.trim())
  };
  match &param.default {
    Some(default) if default.is_empty() => format!("{} [Default: '']", label),
    Some(default) => format!("{} [Default: {}]", label, default),
    None if !previous.is_empty() => format!("{} [Previous: {}]", label, previous),
    None if param.allows_empty() => format!("{} [Optional: empty allowed]", label),
    None => format!("{} [Required]", label),
  }
}

/// The previous answer when there is one, otherwise the default and the
/// allowed values.
fn suggestions(param: &TemplateParameter, previous: &str) -> Vec<String> {
  let mut out = Vec::new();
  if !previous.is_empty() {
    push_unique(&mut out, previous);
    return out;
  }
  if let Some(default) = &param.default {
    push_unique(&mut out, default);
  }
  for value in &param.allowed {
    push_unique(&mut out, value);
  }
  out
}

fn non_interactive_value(param: &TemplateParameter, previous: &str) -> Result<String, DeployError> {
  let value = match &param.default {
    Some(default) => default.clone(),
    None if !previous.is_empty() => previous.to_string(),
    None if param.allows_empty() => String::new(),
    None => return Err(DeployError::ParameterRequired(param.name.clone())),
  };
  param.check_allowed(&value).map_err(DeployError::ParameterNotAllowed)?;
  Ok(value)
}

fn prompt_value(
  param: &TemplateParameter,
  previous: &str,
  prompter: &dyn Prompter,
  reporter: &dyn Reporter,
) -> Result<String, DeployError> {
  let title = prompt_title(param, previous);
  let suggestions = suggestions(param, previous);
  loop {
    let answer = prompter
      .input(&title, &suggestions)
      .map_err(DeployError::prompt(format!("parameter {}", param.name)))?;
    let mut value = answer.trim().to_string();
    if value.is_empty()
      && let Some(default) = &param.default
    {
      value = default.clone();
    }
    if value.is_empty() && !previous.is_empty() {
      value = previous.to_string();
    }
    if value.is_empty() && param.allows_empty() {
      return Ok(value);
    }
    if value.is_empty() && param.default.is_none() {
      reporter.warn(&format!("Parameter \"{}\" is required.", param.name));
      continue;
    }
    if let Err(message) = param.check_allowed(&value) {
      reporter.warn(&message);
      continue;
    }
    return Ok(value);
  }
}

/// Resolve every declared parameter, in name order.
///
/// Without a prompter the template default wins, then the previous value,
/// then an empty value where the type allows it. With one, the operator is
/// asked and an empty answer falls back the same way. Values outside a
/// declared `AllowedValues` set are rejected (re-asked interactively).
pub fn resolve_parameters(
  declared: &BTreeMap<String, TemplateParameter>,
  previous: &BTreeMap<String, String>,
  prompter: Option<&dyn Prompter>,
  reporter: &dyn Reporter,
) -> Result<BTreeMap<String, String>, DeployError> {
  let mut values = BTreeMap::new();
  for (name, param) in declared {
    let prev = previous.get(name).map(|v| v.trim()).unwrap_or_default();
    let value = match prompter {
      Some(prompter) => prompt_value(param, prev, prompter, reporter)?,
      None => non_interactive_value(param, prev)?,
    };
    values.insert(name.clone(), value);
  }
  Ok(values)
}
