// src/launch/handoff.rs

//! Step 6: transfer control to the downstream program.

use std::fs::File;
use std::io;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::config::HandoffMode;
use crate::errors::{LaunchError, Result};
use crate::exec::exit_code;

use super::plan::LaunchPlan;

/// Start the downstream program with the plan's environment, working
/// directory, and append-mode log files.
///
/// - `Replace`: the launcher's process image is replaced (`exec`). This only
///   returns if the replacement failed.
/// - `Supervise`: the program runs as a child; its exit code is returned
///   unchanged once it terminates.
pub async fn transfer_control(plan: &LaunchPlan) -> Result<i32> {
    preflight(plan)?;

    let (stdout, stderr) = plan.logs.open_append()?;
    let cmd = build_command(plan, stdout, stderr);

    match plan.handoff {
        #[cfg(unix)]
        HandoffMode::Replace => replace(plan, cmd),
        #[cfg(not(unix))]
        HandoffMode::Replace => {
            warn!("process replacement unsupported here; supervising instead");
            supervise(plan, cmd).await
        }
        HandoffMode::Supervise => supervise(plan, cmd).await,
    }
}

fn build_command(plan: &LaunchPlan, stdout: File, stderr: File) -> Command {
    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.args)
        .current_dir(&plan.workdir)
        .env_clear()
        .envs(plan.environment.iter())
        .stdin(Stdio::inherit())
        .stdout(stdout)
        .stderr(stderr);
    cmd
}

#[cfg(unix)]
fn replace(plan: &LaunchPlan, mut cmd: Command) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    info!(
        command = %plan.command_line(),
        stdout = ?plan.logs.stdout,
        stderr = ?plan.logs.stderr,
        "replacing launcher with downstream program"
    );

    let source = cmd.exec();
    Err(handoff_error(plan, source))
}

// `exec` points fds 1 and 2 at the log files before it can fail, so a
// missing program must be caught while stderr is still the caller's.
#[cfg(unix)]
fn preflight(plan: &LaunchPlan) -> Result<()> {
    match plan.handoff {
        HandoffMode::Replace => ensure_executable(plan),
        HandoffMode::Supervise => Ok(()),
    }
}

#[cfg(not(unix))]
fn preflight(_plan: &LaunchPlan) -> Result<()> {
    Ok(())
}

/// Fail with a `Handoff` error unless the program resolves to an executable
/// file.
#[cfg(unix)]
pub fn ensure_executable(plan: &LaunchPlan) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(found) = plan.locate_program() else {
        let source = io::Error::new(
            io::ErrorKind::NotFound,
            "not found in the working directory or on PATH",
        );
        return Err(handoff_error(plan, source));
    };

    let mode = std::fs::metadata(&found)
        .map_err(|source| handoff_error(plan, source))?
        .permissions()
        .mode();
    if mode & 0o111 == 0 {
        let source = io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is not executable", found.display()),
        );
        return Err(handoff_error(plan, source));
    }

    Ok(())
}

async fn supervise(plan: &LaunchPlan, cmd: Command) -> Result<i32> {
    info!(
        command = %plan.command_line(),
        stdout = ?plan.logs.stdout,
        stderr = ?plan.logs.stderr,
        "starting downstream program"
    );

    let mut child = tokio::process::Command::from(cmd)
        .spawn()
        .map_err(|source| handoff_error(plan, source))?;

    // The child shares our process group and sees the interrupt itself; we
    // stay around to report its exit status.
    let wait = child.wait();
    tokio::pin!(wait);
    let mut watch_interrupts = true;
    let status = loop {
        tokio::select! {
            status = &mut wait => {
                break status.map_err(|source| handoff_error(plan, source))?;
            }
            signal = tokio::signal::ctrl_c(), if watch_interrupts => match signal {
                Ok(()) => info!("interrupt received; waiting for downstream program to exit"),
                Err(e) => {
                    warn!(error = %e, "cannot listen for Ctrl+C");
                    watch_interrupts = false;
                }
            },
        }
    };

    let code = exit_code(status);
    info!(exit_code = code, success = status.success(), "downstream program exited");
    Ok(code)
}

fn handoff_error(plan: &LaunchPlan, source: io::Error) -> LaunchError {
    LaunchError::Handoff {
        program: plan.program.display().to_string(),
        source,
    }
}
