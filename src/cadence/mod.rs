// src/cadence/mod.rs

//! `looplaunch loop`: a fast tick that runs the job command at every
//! interval close.
//!
//! The launcher can hand off to this loop (`program = "looplaunch"`,
//! `args = ["loop"]`), in which case its stdout and stderr already point at
//! the append-mode log files.

pub mod runner;
pub mod schedule;
pub mod settings;

use std::future::Future;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::errors::Result;

pub use runner::{JobOutput, JobRunner, ShellJobRunner};
pub use schedule::CloseSchedule;
pub use settings::LoopSettings;

/// Source of the current time; swapped out in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not at a close.
    Idle,
    /// At a close whose job already ran.
    AlreadyRan,
    /// The job ran and exited with this code.
    Ran { exit_code: i32 },
    /// The job could not be run; the next tick in the same slot retries.
    Failed,
}

#[derive(Debug)]
pub struct CadenceLoop<R: JobRunner> {
    settings: LoopSettings,
    runner: R,
    last_slot: Option<i64>,
}

impl<R: JobRunner> CadenceLoop<R> {
    pub fn new(settings: LoopSettings, runner: R) -> Self {
        Self {
            settings,
            runner,
            last_slot: None,
        }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Evaluate one tick at `now`. Job errors are logged, never returned.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let schedule = self.settings.schedule;
        if !schedule.is_close(now) {
            return TickOutcome::Idle;
        }

        let slot = schedule.slot(now);
        if self.last_slot == Some(slot) {
            debug!(slot, "job already ran for this close");
            return TickOutcome::AlreadyRan;
        }

        info!(at = %now.to_rfc3339(), "interval close; running job");
        match self.runner.run_job(&self.settings.command_line).await {
            Ok(output) => {
                self.last_slot = Some(slot);
                report(&output);
                TickOutcome::Ran {
                    exit_code: output.exit_code,
                }
            }
            Err(e) => {
                error!(error = %e, command = %self.settings.command_line, "job failed to run");
                TickOutcome::Failed
            }
        }
    }

    /// Run the job right now, ignoring the schedule.
    pub async fn run_once(&mut self) -> Result<i32> {
        info!(command = %self.settings.command_line, "running job once");
        let output = self.runner.run_job(&self.settings.command_line).await?;
        report(&output);
        Ok(output.exit_code)
    }

    /// Tick until `shutdown` resolves.
    ///
    /// Each iteration evaluates the clock, then sleeps for the tick interval,
    /// so a long job delays the next tick rather than overlapping it.
    pub async fn run<C, S>(mut self, clock: &C, shutdown: S) -> Result<()>
    where
        C: Clock,
        S: Future<Output = ()>,
    {
        info!(
            tick_secs = self.settings.tick.as_secs(),
            every_minutes = self.settings.schedule.every_minutes(),
            settle_secs = self.settings.schedule.settle_seconds(),
            command = %self.settings.command_line,
            "cadence loop started"
        );

        let tick = self.settings.tick;
        let ticking = async {
            loop {
                self.tick(clock.now()).await;
                tokio::time::sleep(tick).await;
            }
        };

        tokio::select! {
            _ = ticking => {}
            _ = shutdown => {
                info!("shutdown requested; stopping cadence loop");
            }
        }

        Ok(())
    }
}

fn report(output: &JobOutput) {
    if output.success() {
        info!(exit_code = output.exit_code, "job finished");
    } else {
        warn!(exit_code = output.exit_code, "job finished with failure");
    }

    if !output.stdout.is_empty() {
        println!("{}", output.stdout.trim_end_matches('\n'));
    }
    if !output.stderr.is_empty() {
        println!("{}", output.stderr.trim_end_matches('\n'));
    }
}
