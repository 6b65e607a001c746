//! Configuration constants and types for the subprocess bridge

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::DEFAULT_API_KEY_VAR;

/// Default maximum size of one JSON line from the bridge (1MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// How long a stopped bridge gets to exit before it is killed
pub const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How long to wait for forwarded stderr after the process is gone
pub const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Dangerous environment variables that should not be passed to the bridge
///
/// These variables can affect how the subprocess loads and executes code.
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PATH",
    "NODE_OPTIONS",
    "PYTHONPATH",
    "PERL5LIB",
    "RUBYLIB",
];

/// How to launch the bridge process
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Program to run; bare names are looked up on `PATH`
    pub program: PathBuf,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Extra environment; entries named in [`DANGEROUS_ENV_VARS`] are dropped
    pub env: HashMap<String, String>,
    /// Working directory for the bridge
    pub cwd: Option<PathBuf>,
    /// Environment variable the credential is handed over in
    pub api_key_var: String,
    /// Longest accepted stdout line
    pub max_frame_size: usize,
}

impl BridgeConfig {
    /// Bridge running `program` with defaults for everything else
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Hand the credential over in `var`
    #[must_use]
    pub fn api_key_var(mut self, var: impl Into<String>) -> Self {
        self.api_key_var = var.into();
        self
    }

    /// Limit on one line of bridge output
    #[must_use]
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Extra environment with dangerous entries removed
    pub(super) fn filtered_env(&self) -> impl Iterator<Item = (&String, &String)> {
        self.env
            .iter()
            .filter(|(key, _)| !DANGEROUS_ENV_VARS.contains(&key.as_str()))
    }
}
