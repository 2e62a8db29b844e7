// src/launch/environment.rs

//! The environment handed to the downstream program.
//!
//! Built up as a plain value and passed to the child in one go
//! (`env_clear` + `envs`); the launcher's own process environment is never
//! modified.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ControlSection;
use crate::envfile::EnvOverrides;
use crate::errors::{LaunchError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl LaunchEnvironment {
    /// Snapshot of the launcher's own environment.
    pub fn inherit() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Value as UTF-8, if set and representable.
    pub fn get_str(&self, key: impl AsRef<OsStr>) -> Option<&str> {
        self.get(key).and_then(OsStr::to_str)
    }

    pub fn contains(&self, key: impl AsRef<OsStr>) -> bool {
        self.vars.contains_key(key.as_ref())
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: impl AsRef<OsStr>) -> Option<OsString> {
        self.vars.remove(key.as_ref())
    }

    /// Replace every variable, e.g. with what an activation script produced.
    pub fn replace_all(&mut self, other: LaunchEnvironment) {
        self.vars = other.vars;
    }

    /// Export every override, replacing existing values.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) {
        for (key, value) in overrides.iter() {
            if self.contains(key) {
                debug!(key, "env file overrides inherited variable");
            }
            self.set(key, value);
        }
    }

    /// Force the control variables. Runs last, so these always win over the
    /// inherited environment and the env file.
    pub fn apply_control(&mut self, control: &ControlSection) {
        self.set(&control.flags_var, &control.flags);
        self.set(&control.tick_var, &control.tick_seconds);
    }

    /// Entries of `PATH`, in search order.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        self.get("PATH")
            .map(|path| std::env::split_paths(path).collect())
            .unwrap_or_default()
    }

    /// Put `dir` at the front of `PATH`.
    pub fn prepend_path(&mut self, dir: &Path) -> Result<()> {
        let mut entries = vec![dir.to_path_buf()];
        entries.extend(self.path_entries());
        let joined = std::env::join_paths(entries).map_err(|e| {
            LaunchError::ConfigError(format!("cannot add {:?} to PATH: {e}", dir))
        })?;
        self.set("PATH", joined);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
