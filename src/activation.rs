// src/activation.rs

//! Optional isolated-runtime activation (a Python venv in the stock layout).
//!
//! - [`ActivationMode::Venv`] reproduces what sourcing `bin/activate` does,
//!   without running a shell.
//! - [`ActivationMode::Source`] really sources the script with `sh` and takes
//!   the environment it leaves behind, for activation scripts that do more.
//!
//! A missing script is not an error; the environment is left unchanged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::ActivationMode;
use crate::errors::{LaunchError, Result};
use crate::launch::LaunchEnvironment;

/// An activation script that exists in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeActivation {
    pub script: PathBuf,
    pub mode: ActivationMode,
}

impl RuntimeActivation {
    /// Look for `script` (relative to `workdir`). `None` if there is no file.
    pub fn detect(workdir: &Path, script: &Path, mode: ActivationMode) -> Option<Self> {
        let script = workdir.join(script);
        if script.is_file() {
            Some(Self { script, mode })
        } else {
            debug!(script = ?script, "no activation script; runtime unchanged");
            None
        }
    }

    /// Apply the activation to `env`.
    pub fn apply(&self, env: &mut LaunchEnvironment, workdir: &Path) -> Result<()> {
        match self.mode {
            ActivationMode::Venv => self.apply_venv(env),
            ActivationMode::Source => self.apply_source(env, workdir),
        }
    }

    /// `<root>/bin/activate` -> (`<root>`, `<root>/bin`).
    pub fn venv_dirs(&self) -> Result<(PathBuf, PathBuf)> {
        let bin = self
            .script
            .parent()
            .ok_or_else(|| self.error("script has no parent directory"))?;
        let root = bin
            .parent()
            .ok_or_else(|| self.error("bin directory has no parent directory"))?;
        Ok((root.to_path_buf(), bin.to_path_buf()))
    }

    fn apply_venv(&self, env: &mut LaunchEnvironment) -> Result<()> {
        let (root, bin) = self.venv_dirs()?;
        let prompt = root
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("venv"));

        env.set("VIRTUAL_ENV", root.as_os_str());
        env.set("VIRTUAL_ENV_PROMPT", prompt);
        env.remove("PYTHONHOME");
        env.prepend_path(&bin)?;

        info!(venv = ?root, "activated virtual environment");
        Ok(())
    }

    #[cfg(unix)]
    fn apply_source(&self, env: &mut LaunchEnvironment, workdir: &Path) -> Result<()> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(r#". "$1" >/dev/null && env -0"#)
            .arg("sh")
            .arg(&self.script)
            .current_dir(workdir)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| self.error(format!("spawning sh: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.error(format!(
                "sourcing exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let sourced = parse_env_dump(&output.stdout).map_err(|reason| self.error(reason))?;
        debug!(vars = sourced.len(), "adopting environment from activation script");
        env.replace_all(sourced);

        info!(script = ?self.script, "sourced activation script");
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_source(&self, _env: &mut LaunchEnvironment, _workdir: &Path) -> Result<()> {
        Err(self.error("mode = \"source\" needs a POSIX shell"))
    }

    fn error(&self, reason: impl Into<String>) -> LaunchError {
        LaunchError::Activation {
            script: self.script.clone(),
            reason: reason.into(),
        }
    }
}

/// Parse the NUL-separated `KEY=VALUE` output of `env -0`.
#[cfg(unix)]
pub fn parse_env_dump(dump: &[u8]) -> std::result::Result<LaunchEnvironment, String> {
    use std::os::unix::ffi::OsStrExt;

    let mut vars = Vec::new();
    for record in dump.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let eq = record
            .iter()
            .position(|b| *b == b'=')
            .ok_or_else(|| {
                format!(
                    "unexpected record in environment dump: {:?}",
                    String::from_utf8_lossy(record)
                )
            })?;
        let key = std::ffi::OsStr::from_bytes(&record[..eq]).to_os_string();
        let value = std::ffi::OsStr::from_bytes(&record[eq + 1..]).to_os_string();
        vars.push((key, value));
    }
    Ok(LaunchEnvironment::from_vars(vars))
}
