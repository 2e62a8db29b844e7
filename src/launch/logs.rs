// src/launch/logs.rs

//! Log destinations for the downstream program's stdout and stderr.
//!
//! Both files are opened in append mode so repeated launches accumulate
//! history instead of truncating it.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::LogsSection;
use crate::errors::{LaunchError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTargets {
    pub dir: PathBuf,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl LogTargets {
    /// Where the logs go for `workdir`; touches nothing on disk.
    pub fn resolve(workdir: &Path, logs: &LogsSection) -> Self {
        let dir = workdir.join(&logs.dir);
        Self {
            stdout: dir.join(&logs.stdout),
            stderr: dir.join(&logs.stderr),
            dir,
        }
    }

    /// Create the log directory if needed. Idempotent.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| LaunchError::LogDir {
            path: self.dir.clone(),
            source,
        })?;
        debug!(dir = ?self.dir, "log directory ready");
        Ok(())
    }

    /// Open (creating if needed) both log files for appending.
    pub fn open_append(&self) -> Result<(File, File)> {
        Ok((open_append(&self.stdout)?, open_append(&self.stderr)?))
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LaunchError::LogDir {
            path: path.to_path_buf(),
            source,
        })
}
