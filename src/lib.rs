//! # act_control
//!
//! HTTP-controlled browser automation agent with per-operation output
//! capture.
//!
//! A single [`SessionController`] owns at most one agent session. It starts
//! and stops the agent, forwards natural-language commands to it one at a
//! time, and returns everything the agent printed or logged during each call
//! as [`CapturedTelemetry`] alongside the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use act_control::agent::subprocess::{BridgeConfig, SubprocessAgentFactory};
//! use act_control::{ControllerConfig, SessionController, StartRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     act_control::capture::logger::init();
//!
//!     let bridge = BridgeConfig::new("python3").args(["-m", "act_bridge"]);
//!     let controller = Arc::new(SessionController::new(
//!         ControllerConfig::from_env(),
//!         SubprocessAgentFactory::new(bridge),
//!     ));
//!
//!     controller.start(StartRequest::default()).await?;
//!     let response = controller.dispatch("search for a coffee maker").await?;
//!     println!("{}", response.result);
//!     print!("{}", response.telemetry.console_text);
//!     controller.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Agents
//!
//! The controller only talks to the [`Agent`] trait. The crate ships
//! [`SubprocessAgent`](agent::subprocess::SubprocessAgent), which drives a
//! helper process over line-delimited JSON; any other implementation can be
//! plugged in through an [`AgentFactory`], including a plain closure.
//!
//! ## Capture
//!
//! Agents write console output through [`capture::console::stdout`] and
//! [`capture::console::stderr`] and log through the `log` facade. Inside a
//! capture window both are collected; outside one they behave normally.

pub mod agent;
pub mod capture;
pub mod config;
pub mod error;
pub mod manager;
pub mod server;
pub mod types;

pub use agent::{Agent, AgentCapabilities, AgentFactory, LaunchOptions};
pub use capture::{CaptureOptions, CaptureWindow, CapturedTelemetry, LogEntry, with_capture};
pub use config::{ControllerConfig, CredentialSource};
pub use error::{AgentError, Result, SessionError};
pub use manager::{PhaseTransition, SessionController, SessionPhase};
pub use types::{
    DispatchRequest, DispatchResponse, SessionId, StartRequest, StartResponse, StatusResponse,
    StopResponse,
};

/// Crate version, passed to bridge processes
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
