//! Session start and stop
//!
//! Both run under the lifecycle lock so at most one lifecycle transition is
//! in flight. `stop` also takes the dispatch lock, so it waits for a running
//! command and leaves later callers looking at an absent session.

use crate::agent::{self, LaunchOptions};
use crate::capture::CapturedTelemetry;
use crate::error::{AgentError, Result, SessionError};
use crate::types::{SessionId, StartRequest, StartResponse, StopResponse};

use super::super::state::SessionPhase;
use super::core::SessionController;

impl SessionController {
    /// Start the agent session
    ///
    /// If a session already exists its identifiers are returned unchanged and
    /// no agent is constructed.
    ///
    /// # Errors
    /// - [`SessionError::Configuration`] when the credential is missing
    /// - [`SessionError::Authentication`] when the agent rejects it
    /// - [`SessionError::Startup`] for any other construction or start failure
    pub async fn start(&self, request: StartRequest) -> Result<StartResponse> {
        let api_key = self.config.api_key().ok_or_else(|| {
            let source = self
                .config
                .credentials
                .env_var()
                .map_or_else(|| "agent API key".to_string(), str::to_string);
            SessionError::configuration(format!("{source} is not set"))
        })?;

        let _lifecycle = self.lifecycle.lock().await;

        if let Some(existing) = self.existing_session() {
            log::info!("Agent session already running; start is a no-op");
            return Ok(existing);
        }

        let launch = LaunchOptions {
            starting_page: request
                .starting_page
                .unwrap_or_else(|| self.config.default_starting_page.clone()),
            headless: request.headless.unwrap_or(self.config.default_headless),
            api_key,
        };

        self.apply(|state| state.begin_start());
        let phase = ResetOnDrop::new(self);
        log::info!(
            "Starting agent session on {} (headless: {})",
            launch.starting_page,
            launch.headless
        );

        let factory = &self.factory;
        let (outcome, telemetry) = self
            .captured(async {
                let mut agent = factory.create(&launch)?;
                agent.start().await?;
                Ok::<_, AgentError>(agent)
            })
            .await;

        let agent = match outcome {
            Ok(agent) => agent,
            Err(e) => {
                drop(phase);
                log::error!("Agent failed to start: {e}");
                return Err(start_failure(e, telemetry));
            }
        };

        let session_id = agent.session_id().map(SessionId::from);
        let logs_location = agent.logs_location();
        let capabilities = agent.capabilities();

        *self.agent.lock().await = Some(agent);
        self.apply(|state| {
            state.mark_running(
                session_id.clone(),
                logs_location.clone(),
                capabilities,
                launch.starting_page.clone(),
                launch.headless,
            )
        });
        phase.disarm();

        log::info!(
            "Agent session running (session: {})",
            session_id.as_ref().map_or("unreported", SessionId::as_str)
        );

        Ok(StartResponse {
            running: true,
            session_id,
            logs_location,
            starting_page: launch.starting_page,
            headless: launch.headless,
            already_running: false,
            telemetry,
        })
    }

    /// Stop the agent session
    ///
    /// With no session this is a successful no-op. Otherwise the session is
    /// always reset to absent, even when the agent's teardown fails.
    ///
    /// # Errors
    /// [`SessionError::Stop`] when teardown failed; the session is already
    /// reset when this is returned
    pub async fn stop(&self) -> Result<StopResponse> {
        let _lifecycle = self.lifecycle.lock().await;
        let mut slot = self.agent.lock().await;

        if self.state.read().phase == SessionPhase::Absent {
            return Ok(StopResponse {
                stopped: false,
                telemetry: CapturedTelemetry::default(),
            });
        }

        self.apply(|state| state.begin_stop());
        let phase = ResetOnDrop::new(self);
        log::info!("Stopping agent session");

        let agent = slot.take();
        let (outcome, telemetry) = self
            .captured(async {
                match agent {
                    Some(mut agent) => agent::teardown(&mut *agent).await,
                    None => Ok(()),
                }
            })
            .await;

        drop(phase);

        match outcome {
            Ok(()) => {
                log::info!("Agent session stopped");
                Ok(StopResponse {
                    stopped: true,
                    telemetry,
                })
            }
            Err(e) => {
                log::warn!("Agent teardown failed; session reset anyway: {e}");
                Err(SessionError::Stop {
                    detail: e.detail(),
                    telemetry,
                })
            }
        }
    }

    /// Status-quo response when a session already exists
    fn existing_session(&self) -> Option<StartResponse> {
        let state = self.state.read();
        if state.phase == SessionPhase::Absent {
            return None;
        }
        Some(StartResponse {
            running: state.phase == SessionPhase::Running,
            session_id: state.session_id.clone(),
            logs_location: state.logs_location.clone(),
            starting_page: state.starting_page.clone().unwrap_or_default(),
            headless: state.headless,
            already_running: true,
            telemetry: CapturedTelemetry::default(),
        })
    }
}

/// Returns the session to `Absent` when dropped while still armed
///
/// Held across every await between leaving `Absent` and settling, so a
/// cancelled `start` or `stop` cannot leave the phase at `Starting` or
/// `Stopping`. Any agent already taken out of the slot is dropped with the
/// cancelled future.
struct ResetOnDrop<'a> {
    controller: &'a SessionController,
    armed: bool,
}

impl<'a> ResetOnDrop<'a> {
    fn new(controller: &'a SessionController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.apply(|state| state.reset());
        }
    }
}

/// Classify a failed start
fn start_failure(error: AgentError, telemetry: CapturedTelemetry) -> SessionError {
    if error.is_authentication() {
        SessionError::Authentication {
            detail: error.detail(),
            telemetry,
        }
    } else {
        SessionError::Startup {
            detail: error.detail(),
            telemetry,
        }
    }
}
