//! Implementation of the `esb artifact` commands.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;

use esb_lib::artifact::{ArtifactManifest, default_manifest_path};
use esb_lib::config::resolve_project_root;
use esb_lib::deploy::default_project_name;
use esb_lib::env::HostEnv;
use esb_lib::util::path::absolutize;

use crate::output::{print_info, print_json, print_stat, symbols};

#[derive(Debug, Subcommand)]
pub enum ArtifactCommand {
  /// Show an artifact manifest
  Show {
    /// Manifest path (defaults to the manifest of --project/--env)
    path: Option<PathBuf>,

    /// Compose project name
    #[arg(short, long)]
    project: Option<String>,

    /// Environment of the default manifest
    #[arg(short, long)]
    env: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

pub fn cmd_artifact(command: &ArtifactCommand) -> Result<()> {
  match command {
    ArtifactCommand::Show {
      path,
      project,
      env: target_env,
      json,
    } => cmd_show(path.as_deref(), project.as_deref(), target_env.as_deref(), *json),
  }
}

fn cmd_show(path: Option<&Path>, project: Option<&str>, target_env: Option<&str>, json: bool) -> Result<()> {
  let host = HostEnv::from_process();
  let cwd = env::current_dir().context("Failed to determine current directory")?;
  let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

  let manifest_path = match path {
    Some(path) => absolutize(path, &cwd),
    None => {
      let Some(target_env) = target_env.filter(|e| !e.trim().is_empty()) else {
        bail!("either a manifest path or --env is required");
      };
      let project = match project {
        Some(project) => project.to_string(),
        None => default_project_name(&host, target_env),
      };
      default_manifest_path(&resolve_project_root(&host, &cwd), &project, target_env)
    }
  };

  let manifest = ArtifactManifest::read(&manifest_path)
    .with_context(|| format!("Failed to load artifact manifest {}", manifest_path.display()))?;

  if json {
    return print_json(&manifest);
  }

  print_info(&format!("Artifact manifest: {}", manifest_path.display()));
  print_stat("Project", &manifest.project);
  print_stat("Env", &manifest.env);
  print_stat("Mode", &manifest.mode);
  print_stat("Generated", &manifest.generated_at);
  print_stat(
    "Generator",
    &format!("{} {}", manifest.generator.name, manifest.generator.version),
  );
  print_stat("Entries", &manifest.artifacts.len().to_string());
  for (i, entry) in manifest.artifacts.iter().enumerate() {
    let root = manifest
      .entry_root(&manifest_path, i)
      .map(|p| p.display().to_string())
      .unwrap_or_else(|| entry.artifact_root.clone());
    println!();
    println!("  {} {}", symbols::ARROW, entry.source_template.path);
    if !entry.id.is_empty() {
      print_stat("  Id", &entry.id);
    }
    print_stat("  Root", &root);
    print_stat("  Template sha256", &entry.source_template.sha256);
    for (name, value) in &entry.source_template.parameters {
      print_stat(&format!("  {}", name), value);
    }
  }
  Ok(())
}
