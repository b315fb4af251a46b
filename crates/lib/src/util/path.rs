//! Lexical path helpers.
//!
//! None of these touch the filesystem.

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` or `~/` to `home`.
///
/// `~user` forms, and everything when `home` is unknown, are returned
/// unchanged.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
  if path == "~" {
    return home.map_or_else(|| PathBuf::from(path), Path::to_path_buf);
  }
  if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    && let Some(home) = home
  {
    return home.join(rest);
  }
  PathBuf::from(path)
}

/// Normalize `.` and `..` components without resolving symlinks.
pub fn clean(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let popped = matches!(out.components().next_back(), Some(Component::Normal(_))) && out.pop();
        if !popped && !out.has_root() {
          out.push("..");
        }
      }
      other => out.push(other.as_os_str()),
    }
  }
  if out.as_os_str().is_empty() {
    out.push(".");
  }
  out
}

/// Join `path` onto `base` when relative, then clean the result.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
  if path.is_absolute() {
    clean(path)
  } else {
    clean(&base.join(path))
  }
}

/// Compute `target` relative to `base`, both expected absolute and clean.
///
/// Returns `None` when the paths share no root (e.g. different drives).
pub fn relative_to(base: &Path, target: &Path) -> Option<PathBuf> {
  let base: Vec<Component> = base.components().collect();
  let target: Vec<Component> = target.components().collect();
  if base.first() != target.first() {
    return None;
  }

  let common = base.iter().zip(target.iter()).take_while(|(a, b)| a == b).count();

  let mut out = PathBuf::new();
  for _ in common..base.len() {
    out.push("..");
  }
  for component in &target[common..] {
    out.push(component.as_os_str());
  }
  if out.as_os_str().is_empty() {
    out.push(".");
  }
  Some(out)
}

/// Render a path with forward slashes, as recorded in manifests.
pub fn to_slash(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clean_removes_dot_segments() {
    assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(clean(Path::new("a/../..")), PathBuf::from(".."));
    assert_eq!(clean(Path::new("/..")), PathBuf::from("/"));
    assert_eq!(clean(Path::new("")), PathBuf::from("."));
  }

  #[test]
  fn absolutize_joins_relative_paths() {
    assert_eq!(
      absolutize(Path::new("out/../art"), Path::new("/proj")),
      PathBuf::from("/proj/art")
    );
    assert_eq!(absolutize(Path::new("/abs/x"), Path::new("/proj")), PathBuf::from("/abs/x"));
  }

  #[test]
  fn relative_to_walks_up_and_down() {
    assert_eq!(
      relative_to(Path::new("/p/.esb/artifacts/demo/dev"), Path::new("/p/artifacts/demo-dev/entries/x")),
      Some(PathBuf::from("../../../../artifacts/demo-dev/entries/x"))
    );
    assert_eq!(relative_to(Path::new("/p"), Path::new("/p")), Some(PathBuf::from(".")));
    assert_eq!(relative_to(Path::new("/p"), Path::new("/p/a/b")), Some(PathBuf::from("a/b")));
  }

  #[test]
  fn expand_home_leaves_plain_paths() {
    let home = Some(Path::new("/home/op"));
    assert_eq!(expand_home("/etc/x", home), PathBuf::from("/etc/x"));
    assert_eq!(expand_home("~other/x", home), PathBuf::from("~other/x"));
    assert_eq!(expand_home("~/x", home), PathBuf::from("/home/op/x"));
    assert_eq!(expand_home("~/x", None), PathBuf::from("~/x"));
  }

  #[test]
  fn to_slash_converts_backslashes() {
    assert_eq!(to_slash(Path::new("a\\b")), "a/b");
  }
}
