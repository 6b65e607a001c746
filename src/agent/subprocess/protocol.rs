//! Wire types for the bridge protocol
//!
//! One JSON object per line in each direction. Requests carry an id; the
//! bridge answers each with exactly one `response` event carrying the same
//! id, and may emit any number of `console` and `log` events before it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capture::console::ConsoleStream;
use crate::error::AgentError;
use crate::types::RequestId;

// ============================================================================
// REQUESTS
// ============================================================================

/// Operation requested from the bridge
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BridgeOp {
    /// Launch the browser agent
    Start {
        /// Page the browser opens on
        starting_page: String,
        /// Run without a visible window
        headless: bool,
    },
    /// Run one command
    Act {
        /// Natural-language command text
        command: String,
    },
    /// Shut the agent down
    Stop,
}

impl BridgeOp {
    /// Operation name as it appears on the wire
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Act { .. } => "act",
            Self::Stop => "stop",
        }
    }
}

/// A request line
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    /// Correlation id echoed in the response
    pub id: RequestId,
    /// What to do
    #[serde(flatten)]
    pub op: BridgeOp,
}

impl BridgeRequest {
    /// New request with a fresh id
    #[must_use]
    pub fn new(op: BridgeOp) -> Self {
        Self {
            id: RequestId::generate(),
            op,
        }
    }

    /// Serialize as one newline-terminated line
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_line(&self) -> Result<String, AgentError> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| AgentError::protocol(format!("Failed to encode request: {e}")))?;
        line.push('\n');
        Ok(line)
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// A line emitted by the bridge
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BridgeEvent {
    /// Text the agent printed
    Console {
        /// Channel it was printed on
        stream: ConsoleStream,
        /// The text, verbatim
        text: String,
    },
    /// A log record from the agent's own logging
    Log {
        /// Level name as the agent spells it
        level: String,
        /// Logger name
        #[serde(default)]
        target: Option<String>,
        /// Rendered message
        message: String,
    },
    /// Completion of a request
    Response(BridgeResponse),
}

impl FromStr for BridgeEvent {
    type Err = AgentError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(line)
            .map_err(|e| AgentError::protocol(format!("Invalid bridge event: {e}")))
    }
}

/// Completion of one request
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    /// Id of the request this completes
    pub id: RequestId,
    /// Whether the operation succeeded
    pub ok: bool,
    /// Result value of an `act`
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Session id, reported on `start`
    #[serde(default)]
    pub session_id: Option<String>,
    /// Agent log location, reported on `start`
    #[serde(default)]
    pub logs_location: Option<String>,
    /// Failure description when `ok` is false
    #[serde(default)]
    pub error: Option<BridgeFailure>,
}

/// Failure class reported by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Credential rejected
    Authentication,
    /// Anything else
    #[default]
    #[serde(other)]
    Failure,
}

/// Failure description
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeFailure {
    /// Failure class
    #[serde(default)]
    pub kind: FailureKind,
    /// Detail text
    pub message: String,
}

impl BridgeResponse {
    /// Turn a failed response into the matching agent error
    ///
    /// # Errors
    /// Returns the reported failure when `ok` is false
    pub fn into_result(self) -> Result<Self, AgentError> {
        if self.ok {
            return Ok(self);
        }
        match self.error {
            Some(BridgeFailure {
                kind: FailureKind::Authentication,
                message,
            }) => Err(AgentError::Authentication(message)),
            Some(BridgeFailure { message, .. }) => Err(AgentError::Failed(message)),
            None => Err(AgentError::failed("Bridge reported failure without detail")),
        }
    }
}

/// Map a level name from the agent's logging onto `log::Level`
///
/// Accepts `log` names and the common Python spellings; unknown names map to
/// `Info`.
#[must_use]
pub fn parse_level(level: &str) -> log::Level {
    match level.to_ascii_lowercase().as_str() {
        "critical" | "fatal" | "error" => log::Level::Error,
        "warning" | "warn" => log::Level::Warn,
        "debug" => log::Level::Debug,
        "trace" => log::Level::Trace,
        _ => log::Level::Info,
    }
}
