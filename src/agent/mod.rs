//! Agent capability interface
//!
//! The controller never looks inside an agent. It constructs one through an
//! [`AgentFactory`], then only calls the entry points of the [`Agent`]
//! trait. Teardown is chosen from the declared [`AgentCapabilities`] rather
//! than by probing the object.
//!
//! # Module Structure
//!
//! - `capabilities` - Capability flags for teardown entry points
//! - `subprocess` - Agent living in a helper process, driven over JSON lines

mod capabilities;
pub mod subprocess;

use std::fmt;

use async_trait::async_trait;

use crate::error::AgentError;

pub use capabilities::AgentCapabilities;

/// Parameters an agent is constructed with
#[derive(Clone)]
pub struct LaunchOptions {
    /// Page the browser opens on start
    pub starting_page: String,
    /// Run the browser without a visible window
    pub headless: bool,
    /// Credential gating the agent
    pub api_key: String,
}

impl fmt::Debug for LaunchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchOptions")
            .field("starting_page", &self.starting_page)
            .field("headless", &self.headless)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Browser automation agent driven by the session controller
///
/// Only `start` and `act` are required. Agents declare which teardown entry
/// point they support through [`Agent::capabilities`]; the defaults for
/// `stop` and `close` report [`AgentError::Unsupported`].
#[async_trait]
pub trait Agent: Send {
    /// Teardown entry points this agent implements
    fn capabilities(&self) -> AgentCapabilities;

    /// Launch the agent
    async fn start(&mut self) -> Result<(), AgentError>;

    /// Execute one natural-language command and return its opaque result
    async fn act(&mut self, command: &str) -> Result<serde_json::Value, AgentError>;

    /// Stop the agent
    async fn stop(&mut self) -> Result<(), AgentError> {
        Err(AgentError::Unsupported("stop"))
    }

    /// Close the agent
    async fn close(&mut self) -> Result<(), AgentError> {
        Err(AgentError::Unsupported("close"))
    }

    /// Session id reported by the agent after start
    fn session_id(&self) -> Option<String> {
        None
    }

    /// Where the agent writes its own logs
    fn logs_location(&self) -> Option<String> {
        None
    }
}

/// Constructs agents for the controller
pub trait AgentFactory: Send + Sync {
    /// Build a new, not yet started, agent
    ///
    /// # Errors
    /// Returns error if the agent cannot be constructed
    fn create(&self, options: &LaunchOptions) -> Result<Box<dyn Agent>, AgentError>;
}

impl<F> AgentFactory for F
where
    F: Fn(&LaunchOptions) -> Result<Box<dyn Agent>, AgentError> + Send + Sync,
{
    fn create(&self, options: &LaunchOptions) -> Result<Box<dyn Agent>, AgentError> {
        self(options)
    }
}

/// Invoke the single teardown entry point the agent declares
///
/// `stop` wins over `close`; an agent declaring neither is left to be
/// dropped.
pub(crate) async fn teardown(agent: &mut dyn Agent) -> Result<(), AgentError> {
    let capabilities = agent.capabilities();
    if capabilities.contains(AgentCapabilities::STOP) {
        agent.stop().await
    } else if capabilities.contains(AgentCapabilities::CLOSE) {
        agent.close().await
    } else {
        log::debug!("Agent declares no teardown entry point; dropping it");
        Ok(())
    }
}
