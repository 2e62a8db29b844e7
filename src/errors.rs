// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant is fatal for the launch sequence: the binary reports it on
//! stderr and exits non-zero. Tolerated absences (no `.env`, no activation
//! script) never produce an error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("working directory {path:?} is not usable: {reason}")]
    WorkdirUnavailable { path: PathBuf, reason: String },

    #[error("{path:?} line {line}: {reason}")]
    EnvFile {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("runtime activation via {script:?} failed: {reason}")]
    Activation { script: PathBuf, reason: String },

    #[error("cannot prepare log destination {path:?}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot hand off to '{program}': {source}")]
    Handoff {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LaunchError>;
