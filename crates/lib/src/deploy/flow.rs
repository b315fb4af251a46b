//! The resolve → confirm → save loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::env_resolver::EnvResolver;
use super::images::{
  IMAGE_RUNTIME_FLAG, IMAGE_URI_FLAG, filter_overrides, parse_overrides, resolve_image_runtimes, resolve_image_sources,
};
use super::summary::{Confirmation, confirm};
use super::{
  Axis, DeployError, DeployRequest, ResolvedDeployInputs, TargetStack, TemplateInput, TemplateSearch, ValueChoice,
  discover_stacks, explicit_project, infer_mode, normalize_compose_files, project_for_env, reconcile,
  resolve_artifact_root, resolve_env, resolve_mode, resolve_parameters, resolve_project, select_stack, source,
};
use crate::artifact::{artifact_root_of, derive_artifact_id, entry_output_dir};
use crate::config::{BuildDefaults, GlobalConfig, ensure_project_config, resolve_project_root};
use crate::container::ClientFactory;
use crate::env::HostEnv;
use crate::interaction::{Prompter, Reporter};
use crate::template::TemplateParser;

/// Collaborators and ambient inputs for one resolution.
///
/// A `None` prompter means the run is non-interactive.
pub struct DeployContext<'a> {
  pub prompter: Option<&'a dyn Prompter>,
  pub reporter: &'a dyn Reporter,
  pub factory: &'a dyn ClientFactory,
  pub env_resolver: &'a dyn EnvResolver,
  pub parser: &'a dyn TemplateParser,
  pub host: &'a HostEnv,
  pub cwd: &'a Path,
}

enum State {
  /// `previous` holds the unconfirmed answers of the last pass.
  Resolving { previous: Option<ResolvedDeployInputs> },
  AwaitingConfirmation(ResolvedDeployInputs),
  Confirmed(ResolvedDeployInputs),
}

/// Resolve, review and (unless `no_save`) remember deploy inputs.
///
/// Each "edit" answer re-enters resolution with the rejected inputs as the
/// defaults for every question. Defaults are persisted only after the
/// operator proceeds.
pub fn resolve_deploy_inputs(ctx: &DeployContext<'_>, request: &DeployRequest) -> Result<ResolvedDeployInputs, DeployError> {
  let project_dir = resolve_project_root(ctx.host, ctx.cwd);
  let config_path = ensure_project_config(&project_dir)?;
  debug!(project_dir = %project_dir.display(), config = %config_path.display(), "resolving deploy inputs");

  let mut state = State::Resolving { previous: None };
  loop {
    state = match state {
      State::Resolving { previous } => {
        let pass = Pass {
          ctx,
          request,
          project_dir: &project_dir,
          config_path: &config_path,
          previous: previous.as_ref(),
        };
        State::AwaitingConfirmation(pass.run()?)
      }
      State::AwaitingConfirmation(inputs) => match confirm(&inputs, ctx.prompter, ctx.host, ctx.cwd)? {
        Confirmation::Proceed => State::Confirmed(inputs),
        Confirmation::Edit => State::Resolving { previous: Some(inputs) },
      },
      State::Confirmed(inputs) => {
        if !request.no_save {
          save_defaults(&config_path, &inputs, ctx.reporter);
        }
        return Ok(inputs);
      }
    };
  }
}

fn save_defaults(config_path: &Path, inputs: &ResolvedDeployInputs, reporter: &dyn Reporter) {
  let result = GlobalConfig::load(config_path).and_then(|mut config| {
    for template in &inputs.templates {
      let defaults = BuildDefaults {
        env: inputs.env.value.clone(),
        mode: inputs.mode.value.as_str().to_string(),
        output_dir: template.output_dir.display().to_string(),
        params: template.parameters.clone(),
        image_sources: template.image_sources.clone(),
        image_runtimes: template
          .image_runtimes
          .iter()
          .map(|(name, runtime)| (name.clone(), runtime.as_str().to_string()))
          .collect(),
      };
      config.record(&template.template_path.display().to_string(), defaults);
    }
    config.save(config_path)
  });
  match result {
    Ok(()) => info!(path = %config_path.display(), templates = inputs.templates.len(), "saved deploy defaults"),
    Err(e) => reporter.warn(&format!("failed to save deploy defaults: {}", e)),
  }
}

/// One resolution pass.
struct Pass<'a> {
  ctx: &'a DeployContext<'a>,
  request: &'a DeployRequest,
  project_dir: &'a Path,
  config_path: &'a Path,
  previous: Option<&'a ResolvedDeployInputs>,
}

impl Pass<'_> {
  fn target_stack(&self) -> Result<Option<TargetStack>, DeployError> {
    let stacks = discover_stacks(self.ctx.factory).unwrap_or_else(|e| {
      self.ctx.reporter.warn(&format!("failed to discover running stacks: {}", e));
      Vec::new()
    });
    select_stack(&stacks, self.ctx.prompter)
  }

  fn previous_env(&self) -> Option<&ValueChoice> {
    self.previous.map(|p| &p.env)
  }

  fn run(&self) -> Result<ResolvedDeployInputs, DeployError> {
    let ctx = self.ctx;
    let request = self.request;

    let explicit = explicit_project(request.project.as_deref(), ctx.host);
    let target_stack = match explicit {
      Some(_) => None,
      None => self.target_stack()?,
    };
    let previous_env = self.previous_env().map(|c| c.value.as_str()).unwrap_or_default();
    let project = resolve_project(
      explicit,
      target_stack.as_ref(),
      request.env.as_deref(),
      previous_env,
      ctx.host,
    )?;

    let config = GlobalConfig::load(self.config_path)?;
    let history = config.template_history();
    let search = TemplateSearch {
      cwd: ctx.cwd,
      project_dir: self.project_dir,
      host: ctx.host,
      previous: self.previous.and_then(|p| p.templates.first()).map(|t| t.template_path.as_path()),
      history: &history,
    };
    let template_paths = search.resolve(&request.templates, ctx.prompter, ctx.reporter)?;
    let stored = template_paths
      .first()
      .map(|p| config.defaults_for(&p.display().to_string()))
      .unwrap_or_default();

    let env_inference = ctx
      .env_resolver
      .infer_env(&project.value, template_paths.first().map(PathBuf::as_path), ctx.reporter);
    let previous_env = if previous_env.is_empty() { stored.env.as_str() } else { previous_env };
    let carried = self.previous_env().filter(|c| {
      c.explicit && c.source != source::FLAG && env_inference.is_some() && request.env.as_deref().is_none_or(|v| v.trim().is_empty())
    });
    let mut env = match carried {
      Some(choice) => choice.clone(),
      None => resolve_env(
        request.env.as_deref(),
        target_stack.as_ref(),
        env_inference.as_ref(),
        ctx.prompter,
        previous_env,
      )?,
    };

    let mode_inference = infer_mode(ctx.factory, &project.value).unwrap_or_else(|e| {
      ctx.reporter.warn(&format!("failed to infer runtime mode: {}", e));
      None
    });
    if mode_inference.is_some() {
      env = reconcile(
        Axis::Environment,
        env,
        env_inference.as_ref(),
        request.force,
        ctx.prompter,
        ctx.reporter,
      )?;
    }
    let project = project_for_env(project, &env.value, ctx.host);

    let previous_mode = self
      .previous
      .map(|p| p.mode.value.as_str())
      .unwrap_or(stored.mode.as_str());
    let mode = resolve_mode(
      request.mode.as_deref(),
      mode_inference.as_ref(),
      request.force,
      ctx.prompter,
      previous_mode,
      ctx.reporter,
    )?;

    let previous_root = self.previous_root(&stored, &env.value);
    let artifact_root = resolve_artifact_root(
      request.output.as_deref(),
      ctx.prompter,
      previous_root.as_deref(),
      self.project_dir,
      &project.value,
      &env.value,
      ctx.host,
    )?;

    let uri_overrides = parse_overrides(&request.image_uris, IMAGE_URI_FLAG)?;
    let runtime_overrides = parse_overrides(&request.image_runtimes, IMAGE_RUNTIME_FLAG)?;
    let templates = template_paths
      .iter()
      .map(|path| self.template_input(path, &config, &artifact_root, &uri_overrides, &runtime_overrides))
      .collect::<Result<Vec<_>, _>>()?;

    let inputs = ResolvedDeployInputs {
      project_dir: self.project_dir.to_path_buf(),
      target_stack,
      project,
      env,
      mode,
      artifact_root,
      templates,
      compose_files: normalize_compose_files(&request.compose_files, self.project_dir, ctx.host),
    };
    info!(
      project = %inputs.project.value,
      env = %inputs.env.value,
      mode = %inputs.mode.value,
      templates = inputs.templates.len(),
      "resolved deploy inputs"
    );
    Ok(inputs)
  }

  /// Artifact root to offer as the default, dropped once the env changed.
  fn previous_root(&self, stored: &BuildDefaults, env: &str) -> Option<PathBuf> {
    if let Some(previous) = self.previous {
      return (previous.env.value == env).then(|| previous.artifact_root.clone());
    }
    if !stored.env.is_empty() && stored.env != env {
      return None;
    }
    artifact_root_of(Path::new(stored.output_dir.trim()))
  }

  fn template_input(
    &self,
    path: &Path,
    config: &GlobalConfig,
    artifact_root: &Path,
    uri_overrides: &BTreeMap<String, String>,
    runtime_overrides: &BTreeMap<String, String>,
  ) -> Result<TemplateInput, DeployError> {
    let ctx = self.ctx;
    let stored = config.defaults_for(&path.display().to_string());
    let last = self.previous.and_then(|p| p.template(path));

    let previous_params = last.map(|t| t.parameters.clone()).unwrap_or(stored.params);
    let declared = ctx.parser.parameters(path)?;
    let parameters = resolve_parameters(&declared, &previous_params, ctx.prompter, ctx.reporter)?;

    let functions = ctx.parser.image_functions(path, &parameters)?;
    let previous_sources = last.map(|t| t.image_sources.clone()).unwrap_or(stored.image_sources);
    let image_sources = resolve_image_sources(&functions, &filter_overrides(uri_overrides, &functions), &previous_sources);
    let previous_runtimes: BTreeMap<String, String> = match last {
      Some(t) => t
        .image_runtimes
        .iter()
        .map(|(name, runtime)| (name.clone(), runtime.as_str().to_string()))
        .collect(),
      None => stored.image_runtimes,
    };
    let image_runtimes = resolve_image_runtimes(
      &functions,
      &image_sources,
      &filter_overrides(runtime_overrides, &functions),
      &previous_runtimes,
      ctx.prompter,
      ctx.reporter,
    )?;

    let (artifact_id, template_sha256) = derive_artifact_id(self.project_dir, path, &parameters)?;
    let output_dir = entry_output_dir(artifact_root, &artifact_id);
    debug!(template = %path.display(), id = %artifact_id, "resolved template");
    Ok(TemplateInput {
      template_path: path.to_path_buf(),
      output_dir,
      artifact_id,
      template_sha256,
      parameters,
      image_sources,
      image_runtimes,
    })
  }
}
