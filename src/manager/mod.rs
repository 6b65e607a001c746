//! Agent session management
//!
//! Provides `SessionController`, the single owner of the agent session. It
//! enforces one session and one in-flight command at a time and wraps every
//! call into the agent in a capture window.
//!
//! # Module Structure
//!
//! - `controller` - `SessionController` with its public API
//! - `state` - Session phase and identifiers

mod controller;
mod state;

pub use controller::SessionController;
pub use state::{PhaseTransition, SessionPhase};
