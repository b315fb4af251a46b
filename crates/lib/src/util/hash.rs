//! Hashing utilities for artifact identity and provenance.
//!
//! This module provides:
//! - `ArtifactId`: a truncated 20-character hash identifying a template instance
//! - `ContentHash`: a full 64-character hash for content verification
//! - `hash_directory()`: deterministic directory hashing
//! - `hash_file()`: single file hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::ARTIFACT_ID_LEN;

pub type HashError = serde_json::Error;

/// A content-addressed ID for one rendered template instance.
///
/// The ID is a 20-character truncated SHA-256 of the JSON-serialized identity
/// struct. Serialized maps must be ordered (`BTreeMap`) so that the same
/// logical input always produces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl std::fmt::Display for ArtifactId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_id(&self) -> Result<ArtifactId, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(ArtifactId(full[..ARTIFACT_ID_LEN].to_string()))
  }
}

/// A full 64-character SHA256 hash for content verification.
///
/// The hash is a lowercase hexadecimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error during file or directory hashing.
#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("no files found under {path}")]
  Empty { path: String },
}

/// Compute a deterministic hash of the regular files below `path`.
///
/// Each file contributes `<relative path>:<sha256>`; entries are sorted by
/// path so walk order never matters. Directories and symlinks are skipped and
/// an empty tree is an error, since an empty digest would silently pass
/// verification.
pub fn hash_directory(path: &Path) -> Result<ContentHash, DirHashError> {
  let mut entries: Vec<String> = Vec::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let entry_path = entry.path();
    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");
    let content_hash = hash_file(entry_path)?;
    entries.push(format!("{}:{}", rel_path, content_hash.0));
  }

  if entries.is_empty() {
    return Err(DirHashError::Empty {
      path: path.display().to_string(),
    });
  }

  entries.sort();

  let mut hasher = Sha256::new();
  for entry in entries {
    hasher.update(entry.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let mut file = fs::File::open(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| DirHashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}
