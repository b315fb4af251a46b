//! Staging directory layout.
//!
//! Rendered runtime configuration lands in
//! `<staging root>/<compose project>/<env>/config`. The root is chosen from,
//! in order: the host `_STAGING_DIR` variable, `<_STAGING_HOME>/staging`,
//! `<template dir>/.esb/staging`, then a per-user cache directory.
//!
//! Nothing here creates directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{APP_NAME, DEFAULT_ENV, HOME_DIR, HOST_SUFFIX_STAGING_DIR, HOST_SUFFIX_STAGING_HOME};
use crate::env::HostEnv;
use crate::util::path::absolutize;

const STAGING_DIR: &str = "staging";
const CONFIG_DIR: &str = "config";

/// Staging root for a template (or the global root when none is known).
pub fn root_dir(env: &HostEnv, cwd: &Path, template_path: Option<&Path>) -> PathBuf {
  if let Some(dir) = env.host(HOST_SUFFIX_STAGING_DIR) {
    return absolutize(&env.expand_home(dir), cwd);
  }
  if let Some(home) = env.host(HOST_SUFFIX_STAGING_HOME) {
    return absolutize(&env.expand_home(home).join(STAGING_DIR), cwd);
  }
  if let Some(template) = template_path
    && let Some(dir) = template.parent()
  {
    return absolutize(&dir.join(HOME_DIR).join(STAGING_DIR), cwd);
  }
  global_root_dir(env, cwd)
}

fn global_root_dir(env: &HostEnv, cwd: &Path) -> PathBuf {
  if let Some(xdg) = env.get("XDG_CACHE_HOME") {
    return absolutize(&Path::new(xdg).join(APP_NAME).join(STAGING_DIR), cwd);
  }
  match env.home_dir() {
    Some(home) => absolutize(&home.join(HOME_DIR).join(".cache").join(STAGING_DIR), cwd),
    None => absolutize(&Path::new(HOME_DIR).join(".cache").join(STAGING_DIR), cwd),
  }
}

/// Lower-cased env key, `default` when blank.
fn env_key(env: &str) -> String {
  let key = env.trim().to_lowercase();
  if key.is_empty() { DEFAULT_ENV.to_string() } else { key }
}

/// Config directory for a project/env pair under `root`.
pub fn config_dir(root: &Path, compose_project: &str, env: &str) -> PathBuf {
  root.join(compose_project.trim()).join(env_key(env)).join(CONFIG_DIR)
}

/// Env names with a staged config directory for `compose_project`, sorted.
///
/// A missing root or project directory yields an empty list.
pub fn discover_envs(root: &Path, compose_project: &str) -> io::Result<Vec<String>> {
  let project_dir = root.join(compose_project.trim());
  let entries = match fs::read_dir(&project_dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(e),
  };

  let mut envs = Vec::new();
  for entry in entries {
    let entry = entry?;
    if !entry.file_type()?.is_dir() {
      continue;
    }
    if entry.path().join(CONFIG_DIR).is_dir() {
      envs.push(entry.file_name().to_string_lossy().to_string());
    }
  }
  envs.sort();
  envs.dedup();
  Ok(envs)
}

/// Env name from a `.../<env>/config` path below `root`.
pub fn env_from_config_path(path: &str, root: &Path) -> Option<String> {
  let trimmed = path.trim();
  if trimmed.is_empty() {
    return None;
  }
  let cleaned = crate::util::path::clean(Path::new(trimmed));
  if cleaned.file_name()? != CONFIG_DIR {
    return None;
  }
  let root = crate::util::path::clean(root);
  if !cleaned.starts_with(&root) || cleaned == root {
    return None;
  }
  let env_dir = cleaned.parent()?;
  if env_dir == root {
    return None;
  }
  let env = env_dir.file_name()?.to_string_lossy().trim().to_string();
  if env.is_empty() { None } else { Some(env) }
}
