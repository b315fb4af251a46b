//! Review summary and the proceed/edit question.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use super::{DeployError, ResolvedDeployInputs, TemplateInput};
use crate::env::HostEnv;
use crate::interaction::{Prompter, SelectOption};
use crate::staging;

const PROCEED: &str = "proceed";
const EDIT: &str = "edit";

/// Operator's answer to the review prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
  Proceed,
  Edit,
}

fn push_block(out: &mut String, heading: &str, entries: &BTreeMap<String, String>) {
  if entries.is_empty() {
    return;
  }
  let _ = writeln!(out, "{}", heading);
  for (key, value) in entries {
    let _ = writeln!(out, "  {} = {}", key, value);
  }
}

fn push_template(out: &mut String, inputs: &ResolvedDeployInputs, template: &TemplateInput, host: &HostEnv, cwd: &Path) {
  let staging_root = staging::root_dir(host, cwd, Some(&template.template_path));
  let staging_config = staging::config_dir(&staging_root, &inputs.project.value, &inputs.env.value);
  let _ = writeln!(out, "Template: {}", template.template_path.display());
  let _ = writeln!(out, "Output: {}", template.output_dir.display());
  let _ = writeln!(out, "Staging config: {}", staging_config.display());
  push_block(out, "Parameters:", &template.parameters);
  push_block(out, "Image sources:", &template.image_sources);
  let runtimes: BTreeMap<String, String> = template
    .image_runtimes
    .iter()
    .map(|(name, runtime)| (name.clone(), runtime.choice().to_string()))
    .collect();
  push_block(out, "Image runtimes:", &runtimes);
}

/// Multi-line review of resolved inputs. Map entries are listed in key
/// order.
pub fn render_summary(inputs: &ResolvedDeployInputs, host: &HostEnv, cwd: &Path) -> String {
  let mut out = String::from("Review inputs:\n");
  if let Some(stack) = &inputs.target_stack {
    let _ = writeln!(out, "Target Stack: {}", stack.name);
  }
  let _ = writeln!(out, "Project: {} ({})", inputs.project.value, inputs.project.source);
  let _ = writeln!(out, "Env: {} ({})", inputs.env.value, inputs.env.source);
  let _ = writeln!(out, "Mode: {}", inputs.mode.value);
  let _ = writeln!(out, "Artifact root: {}", inputs.artifact_root.display());
  if inputs.templates.len() > 1 {
    let _ = writeln!(out, "Templates: {}", inputs.templates.len());
  }
  for template in &inputs.templates {
    push_template(&mut out, inputs, template, host, cwd);
  }
  if !inputs.compose_files.is_empty() {
    let files: Vec<String> = inputs.compose_files.iter().map(|p| p.display().to_string()).collect();
    let _ = writeln!(out, "Compose files: {}", files.join(", "));
  }
  out
}

/// Show the summary and ask whether to proceed. Non-interactive runs
/// always proceed.
pub fn confirm(
  inputs: &ResolvedDeployInputs,
  prompter: Option<&dyn Prompter>,
  host: &HostEnv,
  cwd: &Path,
) -> Result<Confirmation, DeployError> {
  let Some(prompter) = prompter else {
    return Ok(Confirmation::Proceed);
  };
  let title = format!("{}\nProceed with these inputs?", render_summary(inputs, host, cwd));
  let options = [SelectOption::new("Proceed", PROCEED), SelectOption::new("Edit", EDIT)];
  let answer = prompter
    .select_value(&title, &options)
    .map_err(DeployError::prompt("confirmation"))?;
  match answer.trim() {
    EDIT => Ok(Confirmation::Edit),
    _ => Ok(Confirmation::Proceed),
  }
}
