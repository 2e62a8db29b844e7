// src/logging.rs

//! Diagnostics for the launcher itself.
//!
//! Everything goes to stderr: before the handoff that is whoever started the
//! launcher (a terminal, systemd, supervisord). In `replace` mode nothing is
//! logged after the handoff; in `loop` mode stderr is usually already
//! `logs/loop.err.log`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "LOOPLAUNCH_LOG";

/// Install the global subscriber. The `--log-level` flag wins over
/// `LOOPLAUNCH_LOG`; an unset or unrecognised variable means `info`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let from_env = std::env::var(LOG_ENV_VAR).ok();
    let level = effective_level(cli_level, from_env.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

pub fn effective_level(cli_level: Option<LogLevel>, from_env: Option<&str>) -> Level {
    match cli_level {
        Some(LogLevel::Error) => Level::ERROR,
        Some(LogLevel::Warn) => Level::WARN,
        Some(LogLevel::Info) => Level::INFO,
        Some(LogLevel::Debug) => Level::DEBUG,
        Some(LogLevel::Trace) => Level::TRACE,
        None => from_env.and_then(parse_level_str).unwrap_or(Level::INFO),
    }
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
