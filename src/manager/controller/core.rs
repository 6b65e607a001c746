//! Core controller structure and read-only operations
//!
//! Provides the `SessionController` struct with construction, `status`,
//! transition subscription and shutdown.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast};

use crate::agent::{Agent, AgentFactory};
use crate::capture::{self, CaptureOptions, CapturedTelemetry};
use crate::config::ControllerConfig;
use crate::types::StatusResponse;

use super::super::state::{PhaseTransition, SessionState};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Capacity of the phase transition broadcast channel
const TRANSITION_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// SESSION CONTROLLER CORE
// ============================================================================

/// Owner of the single agent session
///
/// The `SessionController` coordinates the one agent session, handling:
/// - Lifecycle (start, stop) under the lifecycle lock
/// - Command dispatch, one at a time, under the dispatch lock
/// - Output capture around every call into the agent
///
/// Lock order is lifecycle, then dispatch. `status` takes neither.
pub struct SessionController {
    pub(super) config: ControllerConfig,
    pub(super) factory: Arc<dyn AgentFactory>,
    /// Phase and identifiers; never held across an await
    pub(super) state: RwLock<SessionState>,
    /// Lifecycle lock, held for the whole of `start` and `stop`
    pub(super) lifecycle: Mutex<()>,
    /// Dispatch lock, guarding the agent handle itself
    pub(super) agent: Mutex<Option<Box<dyn Agent>>>,
    transitions: broadcast::Sender<PhaseTransition>,
}

impl SessionController {
    /// Create a controller with no session
    pub fn new(config: ControllerConfig, factory: impl AgentFactory + 'static) -> Self {
        Self::with_factory(config, Arc::new(factory))
    }

    /// Create a controller sharing an existing factory
    #[must_use]
    pub fn with_factory(config: ControllerConfig, factory: Arc<dyn AgentFactory>) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            config,
            factory,
            state: RwLock::new(SessionState::default()),
            lifecycle: Mutex::new(()),
            agent: Mutex::new(None),
            transitions,
        }
    }

    /// The configuration this controller runs with
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current phase and identifiers
    ///
    /// Never blocks on an in-flight operation and never fails.
    #[must_use]
    pub fn status(&self) -> StatusResponse {
        self.state.read().snapshot()
    }

    /// Subscribe to phase transitions
    ///
    /// Every transition made after this call is delivered in order.
    #[must_use]
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<PhaseTransition> {
        self.transitions.subscribe()
    }

    /// Stop the session, if any, before the process exits
    ///
    /// Teardown failures are logged, never returned.
    pub async fn shutdown(&self) {
        log::info!("Shutting down session controller...");
        match self.stop().await {
            Ok(response) if response.stopped => log::info!("Agent session stopped"),
            Ok(_) => log::debug!("No agent session to stop"),
            Err(e) => log::warn!("Failed to stop agent session cleanly: {e}"),
        }
        log::info!("Session controller shutdown complete");
    }

    /// Apply a state change and announce it
    pub(super) fn apply<F>(&self, change: F)
    where
        F: FnOnce(&mut SessionState) -> Option<PhaseTransition>,
    {
        let transition = change(&mut *self.state.write());
        if let Some(transition) = transition {
            log::debug!("Session phase {:?} -> {:?}", transition.from, transition.to);
            // No subscribers is fine
            let _ = self.transitions.send(transition);
        }
    }

    /// Run `future` inside a capture window configured for this controller
    pub(super) async fn captured<F>(&self, future: F) -> (F::Output, CapturedTelemetry)
    where
        F: std::future::Future,
    {
        let options = CaptureOptions {
            echo_console: self.config.echo_console,
        };
        capture::with_capture(options, future).await
    }
}
