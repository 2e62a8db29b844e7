// src/cadence/runner.rs

//! Pluggable job execution for the cadence loop.
//!
//! The loop talks to a `JobRunner` instead of spawning processes itself, so
//! tests can swap in a runner that records commands and returns canned
//! results.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::exec::{exit_code, shell_command};

/// Captured result of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait abstracting how the job command is executed.
pub trait JobRunner: Send {
    /// Run `command` to completion and capture its output.
    fn run_job(
        &mut self,
        command: &str,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutput>> + Send + '_>>;
}

/// Runs the job through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct ShellJobRunner {
    workdir: Option<PathBuf>,
}

impl ShellJobRunner {
    pub fn new(workdir: Option<PathBuf>) -> Self {
        Self { workdir }
    }
}

impl JobRunner for ShellJobRunner {
    fn run_job(
        &mut self,
        command: &str,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutput>> + Send + '_>> {
        let command = command.to_string();
        let workdir = self.workdir.clone();

        Box::pin(async move {
            let mut cmd = shell_command(&command);
            if let Some(dir) = &workdir {
                cmd.current_dir(dir);
            }
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            debug!(%command, "spawning job");
            let output = cmd
                .output()
                .await
                .with_context(|| format!("running job '{command}'"))?;

            Ok(JobOutput {
                exit_code: exit_code(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}
