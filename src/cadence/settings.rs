// src/cadence/settings.rs

use std::time::Duration;

use crate::config::LauncherConfig;
use crate::errors::{LaunchError, Result};
use crate::launch::LaunchEnvironment;

use super::schedule::CloseSchedule;

/// Loop parameters, read once at startup from the control variables the
/// launcher exported (with `[loop]` defaults when they are unset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub tick: Duration,
    pub flags: String,
    /// `"<loop.command> <flags>"`, run through the shell.
    pub command_line: String,
    pub schedule: CloseSchedule,
}

impl LoopSettings {
    pub fn resolve(cfg: &LauncherConfig, env: &LaunchEnvironment) -> Result<Self> {
        let tick_var = &cfg.control.tick_var;
        let tick_secs = match env.get(tick_var) {
            None => cfg.cadence.default_tick_seconds,
            Some(raw) => {
                let raw = raw.to_string_lossy();
                match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(LaunchError::ConfigError(format!(
                            "{tick_var}='{raw}' is not a positive whole number of seconds"
                        )));
                    }
                }
            }
        };

        let flags = match env.get(&cfg.control.flags_var) {
            Some(flags) => flags.to_string_lossy().into_owned(),
            None => cfg.cadence.default_flags.clone(),
        };

        let command_line = format!("{} {}", cfg.cadence.command, flags)
            .trim()
            .to_string();

        Ok(Self {
            tick: Duration::from_secs(tick_secs),
            flags,
            command_line,
            schedule: CloseSchedule::from_config(&cfg.cadence),
        })
    }
}
