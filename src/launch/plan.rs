// src/launch/plan.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::activation::RuntimeActivation;
use crate::config::{HandoffMode, LauncherConfig};
use crate::envfile::load_env_file;
use crate::errors::Result;

use super::environment::LaunchEnvironment;
use super::logs::LogTargets;
use super::workdir::resolve_workdir;

/// Everything needed to start the downstream program.
///
/// Produced by the launch steps in a fixed order:
/// 1. resolve the working directory
/// 2. load the env override file
/// 3. apply the optional runtime activation
/// 4. force the control variables
/// 5. ensure the log directory exists (skipped by [`LaunchPlan::inspect`])
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub workdir: PathBuf,
    /// The env file, if one was found and loaded.
    pub env_file: Option<PathBuf>,
    /// Keys the env file set, in file order.
    pub override_keys: Vec<String>,
    pub activation: Option<RuntimeActivation>,
    pub environment: LaunchEnvironment,
    pub logs: LogTargets,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub handoff: HandoffMode,
}

impl LaunchPlan {
    /// Run steps 1-5. The only side effect is creating the log directory.
    pub fn prepare(cfg: &LauncherConfig, inherited: LaunchEnvironment) -> Result<Self> {
        let plan = Self::inspect(cfg, inherited)?;
        plan.logs.ensure_dir()?;
        Ok(plan)
    }

    /// Run steps 1-4 without touching the filesystem.
    pub fn inspect(cfg: &LauncherConfig, inherited: LaunchEnvironment) -> Result<Self> {
        let workdir = resolve_workdir(&cfg.workdir())?;
        info!(workdir = ?workdir, "resolved working directory");

        let mut environment = inherited;

        let env_path = workdir.join(&cfg.launch.env_file);
        let loaded = {
            let base = &environment;
            load_env_file(&env_path, cfg.launch.malformed_env_lines, |name| {
                base.get_str(name).map(str::to_string)
            })?
        };
        let (env_file, override_keys) = match loaded {
            Some(loaded) => {
                info!(
                    file = ?loaded.path,
                    count = loaded.overrides.len(),
                    "loaded env overrides"
                );
                environment.apply_overrides(&loaded.overrides);
                let keys = loaded.overrides.keys().map(str::to_string).collect();
                (Some(loaded.path), keys)
            }
            None => (None, Vec::new()),
        };

        let activation =
            RuntimeActivation::detect(&workdir, &cfg.runtime.activate, cfg.runtime.mode);
        if let Some(activation) = &activation {
            activation.apply(&mut environment, &workdir)?;
        }

        environment.apply_control(&cfg.control);
        debug!(
            flags_var = %cfg.control.flags_var,
            tick_var = %cfg.control.tick_var,
            "control variables set"
        );

        let logs = LogTargets::resolve(&workdir, &cfg.logs);
        let program = resolve_program(&cfg.launch.program, &workdir);

        Ok(Self {
            workdir,
            env_file,
            override_keys,
            activation,
            environment,
            logs,
            program,
            args: cfg.launch.args.clone(),
            handoff: cfg.launch.handoff,
        })
    }

    /// The program and its arguments as one display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Where a bare program name would be found on the plan's `PATH`.
    pub fn locate_program(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 || self.program.is_absolute() {
            return Some(self.program.clone()).filter(|p| p.is_file());
        }
        self.environment
            .path_entries()
            .into_iter()
            .map(|dir| self.workdir.join(dir).join(&self.program))
            .find(|candidate| candidate.is_file())
    }

    /// Human-readable dry-run output.
    pub fn print_dry_run(&self, cfg: &LauncherConfig) {
        println!("looplaunch dry-run");
        println!("  workdir: {}", self.workdir.display());
        match &self.env_file {
            Some(path) => {
                println!("  env file: {}", path.display());
                if !self.override_keys.is_empty() {
                    println!("      keys: {}", self.override_keys.join(", "));
                }
            }
            None => println!("  env file: (none)"),
        }
        match &self.activation {
            Some(activation) => println!(
                "  activation: {} ({:?})",
                activation.script.display(),
                activation.mode
            ),
            None => println!("  activation: (none)"),
        }
        println!("  {}={}", cfg.control.flags_var, cfg.control.flags);
        println!("  {}={}", cfg.control.tick_var, cfg.control.tick_seconds);
        println!("  stdout >> {}", self.logs.stdout.display());
        println!("  stderr >> {}", self.logs.stderr.display());
        println!("  handoff: {:?}", self.handoff);
        println!("  command: {}", self.command_line());
        match self.locate_program() {
            Some(found) => println!("      resolves to: {}", found.display()),
            None => println!("      resolves to: (not found)"),
        }

        debug!("dry-run complete (no execution)");
    }
}

/// Relative paths with a directory part (`./bin/run`, `scripts/loop`)
/// resolve against the working directory; bare names are left for `PATH`.
pub fn resolve_program(program: &str, workdir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        workdir.join(path)
    } else {
        path.to_path_buf()
    }
}
