#![allow(dead_code)]

use std::path::Path;

use looplaunch::config::{
    ActivationMode, HandoffMode, LauncherConfig, MalformedLinePolicy, RawConfigFile,
};

/// Builder for `LauncherConfig` to simplify test setup.
pub struct LauncherConfigBuilder {
    config: RawConfigFile,
}

impl LauncherConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn workdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.launch.workdir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Downstream program run through `sh -c <script>`.
    pub fn sh_program(mut self, script: &str) -> Self {
        self.config.launch.program = "sh".to_string();
        self.config.launch.args = vec!["-c".to_string(), script.to_string()];
        self
    }

    pub fn program(mut self, program: &str, args: &[&str]) -> Self {
        self.config.launch.program = program.to_string();
        self.config.launch.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn handoff(mut self, mode: HandoffMode) -> Self {
        self.config.launch.handoff = mode;
        self
    }

    pub fn malformed_env_lines(mut self, policy: MalformedLinePolicy) -> Self {
        self.config.launch.malformed_env_lines = policy;
        self
    }

    pub fn activation_mode(mut self, mode: ActivationMode) -> Self {
        self.config.runtime.mode = mode;
        self
    }

    pub fn loop_command(mut self, command: &str) -> Self {
        self.config.cadence.command = command.to_string();
        self
    }

    pub fn loop_schedule(mut self, every_minutes: u32, settle_seconds: u32) -> Self {
        self.config.cadence.every_minutes = every_minutes;
        self.config.cadence.settle_seconds = settle_seconds;
        self
    }

    pub fn raw(&self) -> &RawConfigFile {
        &self.config
    }

    pub fn build(self) -> LauncherConfig {
        LauncherConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for LauncherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
