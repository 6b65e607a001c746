//! Session state
//!
//! The finite-state record of the one agent session, plus the metadata the
//! agent reported about itself. Only the controller mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentCapabilities;
use crate::types::{SessionId, StatusResponse};

/// Lifecycle phase of the agent session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No agent exists
    #[default]
    Absent,
    /// An agent is being constructed and started
    Starting,
    /// The agent is ready for commands
    Running,
    /// The agent is being torn down
    Stopping,
}

impl SessionPhase {
    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// `Absent -> Starting -> Running -> Stopping -> Absent`, plus
    /// `Starting -> Absent` when start fails.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Absent, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Absent)
                | (Self::Running, Self::Stopping)
                | (Self::Stopping, Self::Absent)
        )
    }
}

/// One phase change, as broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before the change
    pub from: SessionPhase,
    /// Phase after the change
    pub to: SessionPhase,
    /// When the change happened
    pub at: DateTime<Utc>,
}

/// Mutable session record guarded by the controller
#[derive(Debug, Default)]
pub(super) struct SessionState {
    pub phase: SessionPhase,
    pub session_id: Option<SessionId>,
    pub logs_location: Option<String>,
    pub capabilities: Option<AgentCapabilities>,
    pub starting_page: Option<String>,
    pub headless: bool,
}

impl SessionState {
    /// Move to `next`, refusing illegal transitions
    ///
    /// Identifiers are cleared whenever the session becomes `Absent`.
    fn advance(&mut self, next: SessionPhase) -> Option<PhaseTransition> {
        if !self.phase.can_transition_to(next) {
            log::error!(
                "Refusing illegal session transition {:?} -> {:?}",
                self.phase,
                next
            );
            return None;
        }

        let transition = PhaseTransition {
            from: self.phase,
            to: next,
            at: Utc::now(),
        };
        self.phase = next;

        if next == SessionPhase::Absent {
            self.session_id = None;
            self.logs_location = None;
            self.capabilities = None;
            self.starting_page = None;
            self.headless = false;
        }

        Some(transition)
    }

    pub fn begin_start(&mut self) -> Option<PhaseTransition> {
        self.advance(SessionPhase::Starting)
    }

    pub fn mark_running(
        &mut self,
        session_id: Option<SessionId>,
        logs_location: Option<String>,
        capabilities: AgentCapabilities,
        starting_page: String,
        headless: bool,
    ) -> Option<PhaseTransition> {
        let transition = self.advance(SessionPhase::Running)?;
        self.session_id = session_id;
        self.logs_location = logs_location;
        self.capabilities = Some(capabilities);
        self.starting_page = Some(starting_page);
        self.headless = headless;
        Some(transition)
    }

    pub fn begin_stop(&mut self) -> Option<PhaseTransition> {
        self.advance(SessionPhase::Stopping)
    }

    pub fn reset(&mut self) -> Option<PhaseTransition> {
        self.advance(SessionPhase::Absent)
    }

    pub fn snapshot(&self) -> StatusResponse {
        StatusResponse {
            phase: self.phase,
            running: self.phase == SessionPhase::Running,
            session_id: self.session_id.clone(),
            logs_location: self.logs_location.clone(),
            capabilities: self.capabilities,
        }
    }
}
