// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Running the binary with no arguments performs the launch sequence with the
//! default config lookup, so it can be dropped into a process manager stanza
//! as-is.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `looplaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "looplaunch",
    version,
    about = "Prepare the environment for the trading loop and hand off to it.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$LOOPLAUNCH_CONFIG`, else `Looplaunch.toml` in the current
    /// working directory. A missing default file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory for the downstream program; overrides the config.
    #[arg(long, global = true, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOOPLAUNCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the plan, but don't create anything or run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Prepare the environment and replace this process with the configured program.
    Launch,

    /// Run the cadence loop: fire the job command at every interval close.
    Loop {
        /// Run the job once right now and exit with its status.
        #[arg(long)]
        once: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
