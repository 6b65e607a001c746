//! Command dispatch
//!
//! Commands run strictly one at a time: the dispatch lock guards the agent
//! handle and is held until the agent returns.

use crate::error::{Result, SessionError};
use crate::types::DispatchResponse;

use super::super::state::SessionPhase;
use super::core::SessionController;

impl SessionController {
    /// Send one command to the running agent
    ///
    /// A second caller waits until the first command has completed. A failed
    /// command leaves the session running.
    ///
    /// # Errors
    /// - [`SessionError::NotRunning`] when no session is running
    /// - [`SessionError::Dispatch`] when the agent fails the command
    pub async fn dispatch(&self, command: &str) -> Result<DispatchResponse> {
        let mut slot = self.agent.lock().await;

        if self.state.read().phase != SessionPhase::Running {
            return Err(SessionError::NotRunning);
        }
        let agent = slot.as_mut().ok_or(SessionError::NotRunning)?;

        log::debug!("Dispatching command: {command}");
        let (outcome, telemetry) = self.captured(agent.act(command)).await;

        match outcome {
            Ok(result) => Ok(DispatchResponse { result, telemetry }),
            Err(e) => {
                log::error!("Agent command failed: {e}");
                Err(SessionError::Dispatch {
                    detail: e.detail(),
                    telemetry,
                })
            }
        }
    }
}
