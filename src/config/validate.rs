// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{LauncherConfig, RawConfigFile};
use crate::errors::{LaunchError, Result};

impl TryFrom<RawConfigFile> for LauncherConfig {
    type Error = LaunchError;

    /// Validate a raw config. Relative paths resolve against the process cwd
    /// until the loader rebases them onto the config file's directory.
    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(LauncherConfig::new_unchecked(raw, base_dir))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_launch(cfg)?;
    validate_control(cfg)?;
    validate_logs(cfg)?;
    validate_loop(cfg)?;
    Ok(())
}

fn validate_launch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.launch.program.trim().is_empty() {
        return Err(LaunchError::ConfigError(
            "[launch].program must not be empty".to_string(),
        ));
    }
    if cfg.launch.env_file.as_os_str().is_empty() {
        return Err(LaunchError::ConfigError(
            "[launch].env_file must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_control(cfg: &RawConfigFile) -> Result<()> {
    let control = &cfg.control;
    check_var_name("[control].flags_var", &control.flags_var)?;
    check_var_name("[control].tick_var", &control.tick_var)?;

    if control.flags_var == control.tick_var {
        return Err(LaunchError::ConfigError(format!(
            "[control].flags_var and [control].tick_var are both '{}'",
            control.flags_var
        )));
    }

    // Values are forwarded verbatim; only NUL would make them unrepresentable.
    for (field, value) in [
        ("[control].flags", &control.flags),
        ("[control].tick_seconds", &control.tick_seconds),
    ] {
        if value.contains('\0') {
            return Err(LaunchError::ConfigError(format!(
                "{field} must not contain NUL"
            )));
        }
    }
    Ok(())
}

fn check_var_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LaunchError::ConfigError(format!("{field} must not be empty")));
    }
    if name.contains('=') || name.contains('\0') {
        return Err(LaunchError::ConfigError(format!(
            "{field} '{name}' is not a valid environment variable name"
        )));
    }
    Ok(())
}

fn validate_logs(cfg: &RawConfigFile) -> Result<()> {
    let logs = &cfg.logs;
    if logs.dir.as_os_str().is_empty() {
        return Err(LaunchError::ConfigError(
            "[logs].dir must not be empty".to_string(),
        ));
    }
    check_log_name("[logs].stdout", &logs.stdout)?;
    check_log_name("[logs].stderr", &logs.stderr)?;

    if logs.stdout == logs.stderr {
        return Err(LaunchError::ConfigError(format!(
            "[logs].stdout and [logs].stderr both point at '{}'",
            logs.stdout
        )));
    }
    Ok(())
}

fn check_log_name(field: &str, name: &str) -> Result<()> {
    let plain = Path::new(name)
        .file_name()
        .is_some_and(|file| file == name);
    if name.is_empty() || !plain {
        return Err(LaunchError::ConfigError(format!(
            "{field} must be a plain file name inside [logs].dir (got '{name}')"
        )));
    }
    Ok(())
}

fn validate_loop(cfg: &RawConfigFile) -> Result<()> {
    let cadence = &cfg.cadence;
    if cadence.command.trim().is_empty() {
        return Err(LaunchError::ConfigError(
            "[loop].command must not be empty".to_string(),
        ));
    }
    if !(1..=60).contains(&cadence.every_minutes) {
        return Err(LaunchError::ConfigError(format!(
            "[loop].every_minutes must be within 1..=60 (got {})",
            cadence.every_minutes
        )));
    }
    if cadence.settle_seconds >= 60 {
        return Err(LaunchError::ConfigError(format!(
            "[loop].settle_seconds must be < 60 (got {})",
            cadence.settle_seconds
        )));
    }
    if cadence.default_tick_seconds == 0 {
        return Err(LaunchError::ConfigError(
            "[loop].default_tick_seconds must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
