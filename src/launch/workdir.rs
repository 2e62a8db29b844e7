// src/launch/workdir.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{LaunchError, Result};

/// Resolve the working directory to an absolute, canonical path.
///
/// Fails if the path does not exist, is not a directory, or cannot be listed.
pub fn resolve_workdir(path: &Path) -> Result<PathBuf> {
    let unusable = |reason: String| LaunchError::WorkdirUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let canonical = fs::canonicalize(path).map_err(|e| unusable(e.to_string()))?;
    if !canonical.is_dir() {
        return Err(unusable("not a directory".to_string()));
    }
    fs::read_dir(&canonical).map_err(|e| unusable(e.to_string()))?;

    Ok(canonical)
}
