// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_RUN_FLAGS: &str =
    "--execute --margin CROSSED --relaxed --fallback-on-trend relaxed --news-mode auto --debug";
pub const DEFAULT_TICK_SECONDS: &str = "10";
pub const DEFAULT_LOOP_FLAGS: &str = "--execute --margin CROSSED --override-direction both";

/// What to do with a line of the env file that is not `KEY=VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedLinePolicy {
    /// Abort the launch, naming the file and line.
    #[default]
    Reject,
    /// Log a warning and ignore the line.
    Skip,
}

/// How control passes to the downstream program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the launcher's process image (`exec`). Falls back to
    /// `Supervise` where the platform has no `exec`.
    #[default]
    Replace,
    /// Spawn the program, wait for it, and exit with its status.
    Supervise,
}

/// How the activation script is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// Apply the effect of a Python venv `activate` script natively.
    #[default]
    Venv,
    /// Source the script with `sh` and adopt the resulting environment.
    Source,
}

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [launch]
/// workdir = "/srv/bot"
/// program = "python"
/// args = ["loop.py"]
///
/// [control]
/// tick_seconds = "10"
///
/// [logs]
/// dir = "logs"
/// ```
///
/// All sections are optional; the defaults reproduce the stock launch stanza.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub launch: LaunchSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub control: ControlSection,

    #[serde(default)]
    pub logs: LogsSection,

    #[serde(default, rename = "loop")]
    pub cadence: LoopSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`LauncherConfig::with_base_dir`] on an already validated value.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub launch: LaunchSection,
    pub runtime: RuntimeSection,
    pub control: ControlSection,
    pub logs: LogsSection,
    pub cadence: LoopSection,
    /// Directory relative paths in the config resolve against: the config
    /// file's directory, or the process cwd when no file was read.
    base_dir: PathBuf,
}

impl LauncherConfig {
    pub(crate) fn new_unchecked(raw: RawConfigFile, base_dir: PathBuf) -> Self {
        Self {
            launch: raw.launch,
            runtime: raw.runtime,
            control: raw.control,
            logs: raw.logs,
            cadence: raw.cadence,
            base_dir,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The configured working directory, made absolute against `base_dir`.
    pub fn workdir(&self) -> PathBuf {
        match &self.launch.workdir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        }
    }
}

/// `[launch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchSection {
    /// Working directory; when absent the config file's directory is used.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Env override file, relative to the working directory.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default)]
    pub malformed_env_lines: MalformedLinePolicy,

    /// Downstream program. Bare names are looked up on the prepared `PATH`.
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub handoff: HandoffMode,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_program() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["loop.py".to_string()]
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            workdir: None,
            env_file: default_env_file(),
            malformed_env_lines: MalformedLinePolicy::default(),
            program: default_program(),
            args: default_args(),
            handoff: HandoffMode::default(),
        }
    }
}

/// `[runtime]` section: the optional isolated runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Activation script, relative to the working directory.
    #[serde(default = "default_activate")]
    pub activate: PathBuf,

    #[serde(default)]
    pub mode: ActivationMode,
}

fn default_activate() -> PathBuf {
    PathBuf::from(".venv").join("bin").join("activate")
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            activate: default_activate(),
            mode: ActivationMode::default(),
        }
    }
}

/// `[control]` section: the two variables always forced onto the downstream
/// environment. Values are opaque strings and never interpreted here.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSection {
    #[serde(default = "default_flags_var")]
    pub flags_var: String,

    #[serde(default = "default_flags")]
    pub flags: String,

    #[serde(default = "default_tick_var")]
    pub tick_var: String,

    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: String,
}

fn default_flags_var() -> String {
    "RUN_FLAGS".to_string()
}

fn default_flags() -> String {
    DEFAULT_RUN_FLAGS.to_string()
}

fn default_tick_var() -> String {
    "TICK_SECONDS".to_string()
}

fn default_tick_seconds() -> String {
    DEFAULT_TICK_SECONDS.to_string()
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            flags_var: default_flags_var(),
            flags: default_flags(),
            tick_var: default_tick_var(),
            tick_seconds: default_tick_seconds(),
        }
    }
}

/// `[logs]` section. File names live inside `dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogsSection {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_stdout_log")]
    pub stdout: String,

    #[serde(default = "default_stderr_log")]
    pub stderr: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_stdout_log() -> String {
    "loop.out.log".to_string()
}

fn default_stderr_log() -> String {
    "loop.err.log".to_string()
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            stdout: default_stdout_log(),
            stderr: default_stderr_log(),
        }
    }
}

/// `[loop]` section, read by `looplaunch loop`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopSection {
    /// Job command; the flags are appended to it.
    #[serde(default = "default_loop_command")]
    pub command: String,

    /// The job fires when `minute % every_minutes == 0`.
    #[serde(default = "default_every_minutes")]
    pub every_minutes: u32,

    /// ...and at least this many seconds into that minute.
    #[serde(default = "default_settle_seconds")]
    pub settle_seconds: u32,

    /// Flags used when the flags variable is not set.
    #[serde(default = "default_loop_flags")]
    pub default_flags: String,

    /// Tick used when the tick variable is not set.
    #[serde(default = "default_loop_tick")]
    pub default_tick_seconds: u64,
}

fn default_loop_command() -> String {
    "python run.py".to_string()
}

fn default_every_minutes() -> u32 {
    15
}

fn default_settle_seconds() -> u32 {
    10
}

fn default_loop_flags() -> String {
    DEFAULT_LOOP_FLAGS.to_string()
}

fn default_loop_tick() -> u64 {
    10
}

impl Default for LoopSection {
    fn default() -> Self {
        Self {
            command: default_loop_command(),
            every_minutes: default_every_minutes(),
            settle_seconds: default_settle_seconds(),
            default_flags: default_loop_flags(),
            default_tick_seconds: default_loop_tick(),
        }
    }
}
