#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway working directory with helpers for the files the launcher
/// looks at.
pub struct TestWorkdir {
    dir: TempDir,
}

impl TestWorkdir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `.env` with the given contents.
    pub fn with_env_file(self, contents: &str) -> Self {
        self.write(".env", contents);
        self
    }

    /// Create `.venv/bin/activate` with the given script body.
    pub fn with_venv(self, activate: &str) -> Self {
        self.write(".venv/bin/activate", activate);
        self
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write test file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap_or_default()
    }
}

impl Default for TestWorkdir {
    fn default() -> Self {
        Self::new()
    }
}
