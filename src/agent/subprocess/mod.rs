//! Subprocess bridge agent
//!
//! Runs the browser agent in a helper process and drives it with the
//! line-delimited JSON protocol in [`protocol`].
//!
//! This module is organized into logical submodules:
//! - `config`: Bridge launch settings and constants
//! - `command`: Command line and environment for the process
//! - `codec`: Line framing for the output pipes
//! - `protocol`: Request and event wire types
//! - `transport`: The `SubprocessAgent` itself
//! - `lifecycle`: Spawn, close and drop handling
//! - `exchange`: Request/response loop and event replay

mod codec;
mod command;
pub mod config;
mod exchange;
mod lifecycle;
pub mod protocol;
mod transport;

pub use config::BridgeConfig;
pub use exchange::BRIDGE_LOG_TARGET;
pub use transport::SubprocessAgent;

use super::{Agent, AgentFactory, LaunchOptions};
use crate::error::AgentError;

/// Factory producing one [`SubprocessAgent`] per session
#[derive(Debug, Clone)]
pub struct SubprocessAgentFactory {
    config: BridgeConfig,
}

impl SubprocessAgentFactory {
    /// Factory launching bridges with `config`
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Launch settings used for every agent
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl AgentFactory for SubprocessAgentFactory {
    fn create(&self, options: &LaunchOptions) -> Result<Box<dyn Agent>, AgentError> {
        let agent = SubprocessAgent::new(self.config.clone(), options.clone())?;
        Ok(Box::new(agent))
    }
}
