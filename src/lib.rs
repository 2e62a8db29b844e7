// src/lib.rs

pub mod activation;
pub mod cadence;
pub mod cli;
pub mod config;
pub mod envfile;
pub mod errors;
pub mod exec;
pub mod launch;
pub mod logging;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cadence::{CadenceLoop, LoopSettings, ShellJobRunner, SystemClock};
use crate::cli::{CliArgs, Command};
use crate::config::{LauncherConfig, resolve_config};
use crate::errors::Result;
use crate::launch::{LaunchEnvironment, LaunchPlan, resolve_workdir, transfer_control};

/// High-level entry point used by `main.rs`.
///
/// Returns the exit status the process should end with. With the default
/// `replace` handoff a successful launch never returns here at all.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = resolve_config(args.config.as_deref())?;

    if let Some(dir) = &args.workdir {
        cfg.launch.workdir = Some(absolute(dir));
    }

    match args.command.clone().unwrap_or(Command::Launch) {
        Command::Launch => launch(&cfg, args.dry_run).await,
        Command::Loop { once } => run_loop(&cfg, once, args.dry_run).await,
    }
}

/// Steps 1-6 of the launch sequence.
pub async fn launch(cfg: &LauncherConfig, dry_run: bool) -> Result<i32> {
    let inherited = LaunchEnvironment::inherit();

    if dry_run {
        let plan = LaunchPlan::inspect(cfg, inherited)?;
        plan.print_dry_run(cfg);
        return Ok(0);
    }

    let plan = LaunchPlan::prepare(cfg, inherited)?;
    transfer_control(&plan).await
}

async fn run_loop(cfg: &LauncherConfig, once: bool, dry_run: bool) -> Result<i32> {
    let settings = LoopSettings::resolve(cfg, &LaunchEnvironment::inherit())?;

    if dry_run {
        print_loop_dry_run(&settings);
        return Ok(0);
    }

    let workdir = resolve_workdir(&cfg.workdir())?;
    let mut cadence = CadenceLoop::new(settings, ShellJobRunner::new(Some(workdir)));

    if once {
        return cadence.run_once().await;
    }

    // Ctrl-C -> graceful shutdown.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    };

    cadence.run(&SystemClock, shutdown).await?;
    info!("cadence loop stopped");
    Ok(0)
}

fn print_loop_dry_run(settings: &LoopSettings) {
    println!("looplaunch loop dry-run");
    println!("  tick: {}s", settings.tick.as_secs());
    println!(
        "  fires: minute % {} == 0, second >= {}",
        settings.schedule.every_minutes(),
        settings.schedule.settle_seconds()
    );
    println!("  command: {}", settings.command_line);
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
