//! Bridge command building

use std::process::Stdio;

use tokio::process::Command;

use crate::VERSION;

use super::config::BridgeConfig;

/// Builds the `Command` that launches the bridge
pub struct CommandBuilder<'a> {
    program: &'a std::path::Path,
    config: &'a BridgeConfig,
    api_key: &'a str,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub fn new(program: &'a std::path::Path, config: &'a BridgeConfig, api_key: &'a str) -> Self {
        Self {
            program,
            config,
            api_key,
        }
    }

    /// Build the complete command with arguments, environment and stdio
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.config.args);

        // The credential travels in the environment only, never on the wire
        cmd.envs(self.config.filtered_env())
            .env(&self.config.api_key_var, self.api_key)
            .env("ACT_CONTROL_VERSION", VERSION);

        if let Some(ref cwd) = self.config.cwd {
            cmd.env("PWD", cwd).current_dir(cwd);
        }

        // Pipe stderr instead of inheriting so the child cannot touch the
        // parent terminal; it is forwarded through the console writers.
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd
    }
}
