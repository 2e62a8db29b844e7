// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{LauncherConfig, RawConfigFile};
use crate::errors::{LaunchError, Result};

pub const CONFIG_ENV_VAR: &str = "LOOPLAUNCH_CONFIG";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        LaunchError::ConfigError(format!("reading config file {:?}: {e}", path))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Relative paths inside the file (`workdir`, and through it everything
/// else) resolve against the directory containing the file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LauncherConfig> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = LauncherConfig::try_from(raw_config)?;
    Ok(config.with_base_dir(config_root_dir(path)))
}

/// Find and load the config for this invocation.
///
/// - An explicit path (CLI flag, then `LOOPLAUNCH_CONFIG`) must exist.
/// - Otherwise [`default_config_path`] is used if present.
/// - With no file at all, built-in defaults apply and the cwd is the base.
pub fn resolve_config(explicit: Option<&Path>) -> Result<LauncherConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    if let Some(path) = explicit {
        info!(config = ?path, "loading config");
        return load_and_validate(&path);
    }

    let fallback = default_config_path();
    if fallback.is_file() {
        info!(config = ?fallback, "loading config");
        return load_and_validate(&fallback);
    }

    debug!(config = ?fallback, "no config file; using built-in defaults");
    LauncherConfig::try_from(RawConfigFile::default())
}

/// The config file looked for when none is named: `Looplaunch.toml` in the
/// current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Looplaunch.toml")
}

/// Directory relative config paths resolve against.
///
/// - If the config path has a non-empty parent (e.g. "deploy/Looplaunch.toml"),
///   we use that directory, made absolute.
/// - If it's just a bare filename, we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd,
    }
}
