//! Error types for the session controller and the agents it drives

use thiserror::Error;

use crate::capture::CapturedTelemetry;

/// Errors surfaced by [`SessionController`](crate::SessionController) operations
///
/// Every variant produced after the agent was called carries the telemetry
/// captured up to the point of failure.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Credential missing; the agent was never attempted
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The agent rejected the credential
    #[error("Agent authentication failed: {detail}")]
    Authentication {
        /// Detail reported by the agent
        detail: String,
        /// Output captured while starting
        telemetry: CapturedTelemetry,
    },

    /// Agent construction or start failed for any other reason
    #[error("Failed to start agent: {detail}")]
    Startup {
        /// Detail reported by the agent
        detail: String,
        /// Output captured while starting
        telemetry: CapturedTelemetry,
    },

    /// Operation requires a running session
    #[error("Agent session is not running")]
    NotRunning,

    /// The agent failed to execute a command
    #[error("Command failed: {detail}")]
    Dispatch {
        /// Detail reported by the agent
        detail: String,
        /// Output captured while the command ran
        telemetry: CapturedTelemetry,
    },

    /// Agent teardown failed; the session was still reset
    #[error("Error stopping agent: {detail}")]
    Stop {
        /// Detail reported by the agent
        detail: String,
        /// Output captured while stopping
        telemetry: CapturedTelemetry,
    },
}

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Stable snake_case name of the variant
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Authentication { .. } => "authentication_error",
            Self::Startup { .. } => "startup_error",
            Self::NotRunning => "not_running_error",
            Self::Dispatch { .. } => "dispatch_error",
            Self::Stop { .. } => "stop_error",
        }
    }

    /// The underlying detail string, without the variant prefix
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Configuration(msg) => msg.clone(),
            Self::Authentication { detail, .. }
            | Self::Startup { detail, .. }
            | Self::Dispatch { detail, .. }
            | Self::Stop { detail, .. } => detail.clone(),
            Self::NotRunning => self.to_string(),
        }
    }

    /// Telemetry captured before the failure, if the agent was reached
    #[must_use]
    pub fn telemetry(&self) -> Option<&CapturedTelemetry> {
        match self {
            Self::Authentication { telemetry, .. }
            | Self::Startup { telemetry, .. }
            | Self::Dispatch { telemetry, .. }
            | Self::Stop { telemetry, .. } => Some(telemetry),
            Self::Configuration(_) | Self::NotRunning => None,
        }
    }
}

/// Errors raised by an [`Agent`](crate::agent::Agent) implementation
#[derive(Error, Debug)]
pub enum AgentError {
    /// The agent rejected its credential
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Any other agent-side failure
    #[error("{0}")]
    Failed(String),

    /// The agent does not implement the requested entry point
    #[error("Agent does not support `{0}`")]
    Unsupported(&'static str),

    /// Malformed traffic from a bridged agent
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O error talking to a bridged agent
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a generic failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Whether this is an authentication-class failure
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// The original detail string reported by the agent
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Authentication(detail) | Self::Failed(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}
