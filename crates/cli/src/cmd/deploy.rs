//! Implementation of the `esb deploy` command.
//!
//! Resolves deploy inputs (interactively when attached to a terminal),
//! prepares each artifact entry directory and writes the artifact manifest.
//! Building images and running compose happen downstream of the manifest.

use std::env;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use esb_lib::container::docker::DockerCliFactory;
use esb_lib::deploy::{DeployContext, DeployRequest, FleetEnvResolver, resolve_deploy_inputs, write_artifact_manifest};
use esb_lib::env::HostEnv;
use esb_lib::interaction::Prompter;
use esb_lib::template::SamTemplateParser;

use crate::output::{CliReporter, print_stat, print_success, symbols};
use crate::prompts::TerminalPrompter;

#[derive(Debug, Args)]
pub struct DeployArgs {
  /// Template file or directory (repeatable)
  #[arg(short, long = "template")]
  pub templates: Vec<String>,

  /// Target environment
  #[arg(short, long)]
  pub env: Option<String>,

  /// Runtime mode (docker or containerd)
  #[arg(short, long)]
  pub mode: Option<String>,

  /// Compose project name
  #[arg(short, long)]
  pub project: Option<String>,

  /// Compose files (repeatable, comma-separated)
  #[arg(short = 'f', long = "compose-file")]
  pub compose_files: Vec<String>,

  /// Artifact root directory
  #[arg(short, long)]
  pub output: Option<String>,

  /// Artifact manifest path (relative to the project root)
  #[arg(long)]
  pub manifest: Option<String>,

  /// Image URI override as <function>=<uri> (repeatable)
  #[arg(long = "image-uri")]
  pub image_uris: Vec<String>,

  /// Image runtime override as <function>=<python|java21> (repeatable)
  #[arg(long = "image-runtime")]
  pub image_runtimes: Vec<String>,

  /// Do not remember the confirmed inputs
  #[arg(long)]
  pub no_save: bool,

  /// Keep the requested env/mode even when the running stack disagrees
  #[arg(long)]
  pub force: bool,

  /// Require a bundle manifest in every artifact entry
  #[arg(long)]
  pub bundle: bool,
}

impl From<&DeployArgs> for DeployRequest {
  fn from(args: &DeployArgs) -> Self {
    DeployRequest {
      templates: args.templates.clone(),
      env: args.env.clone(),
      mode: args.mode.clone(),
      project: args.project.clone(),
      compose_files: args.compose_files.clone(),
      output: args.output.clone(),
      manifest: args.manifest.clone(),
      image_uris: args.image_uris.clone(),
      image_runtimes: args.image_runtimes.clone(),
      no_save: args.no_save,
      force: args.force,
      bundle: args.bundle,
    }
  }
}

pub fn cmd_deploy(args: &DeployArgs) -> Result<()> {
  let request = DeployRequest::from(args);
  let host = HostEnv::from_process();
  let cwd = env::current_dir().context("Failed to determine current directory")?;
  let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

  let terminal = TerminalPrompter::detect();
  let factory = DockerCliFactory::default();
  let env_resolver = FleetEnvResolver::new(&factory, &host, &cwd);
  let ctx = DeployContext {
    prompter: terminal.as_ref().map(|p| p as &dyn Prompter),
    reporter: &CliReporter,
    factory: &factory,
    env_resolver: &env_resolver,
    parser: &SamTemplateParser,
    host: &host,
    cwd: &cwd,
  };

  let inputs = resolve_deploy_inputs(&ctx, &request).context("Failed to resolve deploy inputs")?;
  let manifest_path = write_artifact_manifest(&inputs, request.manifest.as_deref(), request.bundle, &host)
    .context("Failed to write artifact manifest")?;
  info!(path = %manifest_path.display(), "deploy inputs recorded");

  print_success(&format!("Artifact manifest: {}", manifest_path.display()));
  print_stat("Project", &inputs.project.value);
  print_stat("Env", &inputs.env.value);
  print_stat("Mode", inputs.mode.value.as_str());
  for template in &inputs.templates {
    print_stat(
      &template.artifact_id.0,
      &format!("{} {} {}", template.template_path.display(), symbols::ARROW, template.output_dir.display()),
    );
  }
  Ok(())
}
