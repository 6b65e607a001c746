//! Agent backed by a bridge subprocess

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio_util::codec::FramedRead;

use crate::agent::{Agent, AgentCapabilities, LaunchOptions};
use crate::error::AgentError;

use super::codec::BridgeLines;
use super::config::BridgeConfig;
use super::protocol::BridgeOp;

/// Browser agent living in a helper process
///
/// The process is spawned by [`Agent::start`] and spoken to over JSON lines
/// on its stdin and stdout. Its raw stderr is read alongside each exchange
/// and forwarded to the console stderr channel, so it lands in the same
/// capture window as the request that produced it.
pub struct SubprocessAgent {
    pub(super) config: BridgeConfig,
    pub(super) launch: LaunchOptions,
    pub(super) program: PathBuf,
    pub(super) process: Option<Child>,
    pub(super) stdin: Option<ChildStdin>,
    pub(super) stdout: Option<FramedRead<ChildStdout, BridgeLines>>,
    pub(super) stderr: Option<FramedRead<ChildStderr, BridgeLines>>,
    pub(super) session_id: Option<String>,
    pub(super) logs_location: Option<String>,
}

impl SubprocessAgent {
    /// Create an agent for `launch`, not yet started
    ///
    /// # Errors
    /// Returns error if the bridge program cannot be found
    pub fn new(config: BridgeConfig, launch: LaunchOptions) -> Result<Self, AgentError> {
        let program = which::which(&config.program).map_err(|e| {
            AgentError::failed(format!(
                "Bridge program `{}` not found: {e}",
                config.program.display()
            ))
        })?;

        Ok(Self {
            config,
            launch,
            program,
            process: None,
            stdin: None,
            stdout: None,
            stderr: None,
            session_id: None,
            logs_location: None,
        })
    }

    /// Whether the bridge process has been spawned and not yet closed
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.process.is_some()
    }
}

#[async_trait]
impl Agent for SubprocessAgent {
    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::STOP
    }

    async fn start(&mut self) -> Result<(), AgentError> {
        self.connect_impl()?;
        let response = self
            .request(BridgeOp::Start {
                starting_page: self.launch.starting_page.clone(),
                headless: self.launch.headless,
            })
            .await?;
        self.session_id = response.session_id;
        self.logs_location = response.logs_location;
        Ok(())
    }

    async fn act(&mut self, command: &str) -> Result<serde_json::Value, AgentError> {
        let response = self
            .request(BridgeOp::Act {
                command: command.to_string(),
            })
            .await?;
        Ok(response.value.unwrap_or(serde_json::Value::Null))
    }

    async fn stop(&mut self) -> Result<(), AgentError> {
        let outcome = self.request(BridgeOp::Stop).await.map(|_| ());
        // The process is reaped whatever the bridge answered
        let closed = self.close_impl().await;
        outcome.and(closed)
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn logs_location(&self) -> Option<String> {
        self.logs_location.clone()
    }
}

impl Drop for SubprocessAgent {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
