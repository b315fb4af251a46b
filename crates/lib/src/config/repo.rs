//! Project root discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{HOST_SUFFIX_REPO, REPO_MARKERS};
use crate::env::HostEnv;
use crate::util::path::absolutize;

/// Search upward from `start` for a directory holding a compose marker file.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
  let mut dir = start.to_path_buf();
  loop {
    if REPO_MARKERS.iter().any(|marker| dir.join(marker).is_file()) {
      return Some(dir);
    }
    if !dir.pop() {
      return None;
    }
  }
}

/// Resolve the project root.
///
/// Priority: the host `_REPO` variable (the root itself or anything below it),
/// then an upward search from `cwd`, then `cwd` itself.
pub fn resolve_project_root(env: &HostEnv, cwd: &Path) -> PathBuf {
  if let Some(repo) = env.host(HOST_SUFFIX_REPO) {
    let candidate = absolutize(&env.expand_home(repo), cwd);
    if let Some(root) = find_repo_root(&candidate) {
      debug!(root = %root.display(), "project root from host variable");
      return root;
    }
    debug!(path = %candidate.display(), "host repo variable does not point at a project root");
  }

  if let Some(root) = find_repo_root(cwd) {
    debug!(root = %root.display(), "project root from upward search");
    return root;
  }

  cwd.to_path_buf()
}
