//! Operation requests and responses

use serde::{Deserialize, Serialize};

use crate::agent::AgentCapabilities;
use crate::capture::CapturedTelemetry;
use crate::manager::SessionPhase;

use super::identifiers::SessionId;

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Parameters for starting a session
///
/// Omitted fields fall back to the controller's configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    /// Page the browser opens on
    #[serde(default)]
    pub starting_page: Option<String>,
    /// Run without a visible browser window
    #[serde(default)]
    pub headless: Option<bool>,
}

impl StartRequest {
    /// Request with both fields set
    pub fn new(starting_page: impl Into<String>, headless: bool) -> Self {
        Self {
            starting_page: Some(starting_page.into()),
            headless: Some(headless),
        }
    }
}

/// A command for the running agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Natural-language command text
    pub command: String,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Response from `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    /// Always true once `start` returns successfully
    pub running: bool,
    /// Session id reported by the agent
    pub session_id: Option<SessionId>,
    /// Agent log location
    pub logs_location: Option<String>,
    /// Page the session was started on (the running session's page when
    /// `already_running`)
    pub starting_page: String,
    /// Headless mode the session was started with
    pub headless: bool,
    /// TRUE when a session already existed and nothing was started
    pub already_running: bool,
    /// Output captured while starting (empty when `already_running`)
    pub telemetry: CapturedTelemetry,
}

/// Response from `dispatch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// Opaque result returned by the agent
    pub result: serde_json::Value,
    /// Output captured while the command ran
    pub telemetry: CapturedTelemetry,
}

/// Response from `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Current lifecycle phase
    pub phase: SessionPhase,
    /// Convenience flag, `phase == Running`
    pub running: bool,
    /// Session id reported by the agent
    pub session_id: Option<SessionId>,
    /// Agent log location
    pub logs_location: Option<String>,
    /// Teardown entry points of the running agent
    pub capabilities: Option<AgentCapabilities>,
}

/// Response from `stop`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    /// FALSE when there was no session to stop
    pub stopped: bool,
    /// Output captured while stopping
    pub telemetry: CapturedTelemetry,
}
