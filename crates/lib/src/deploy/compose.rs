use std::path::{Path, PathBuf};

use crate::env::HostEnv;
use crate::util::path::absolutize;

/// Absolute compose file paths from repeated, comma-separated values.
///
/// Relative entries resolve against the project root. Duplicates are
/// dropped and the first occurrence keeps its position.
pub fn normalize_compose_files(values: &[String], project_dir: &Path, host: &HostEnv) -> Vec<PathBuf> {
  let mut out: Vec<PathBuf> = Vec::new();
  for entry in values.iter().flat_map(|v| v.split(',')).map(str::trim) {
    if entry.is_empty() {
      continue;
    }
    let path = absolutize(&host.expand_home(entry), project_dir);
    if !out.contains(&path) {
      out.push(path);
    }
  }
  out
}
