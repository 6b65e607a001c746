//! Session controller implementation
//!
//! This module is organized into logical submodules:
//! - `core`: Core struct, construction, status and shutdown
//! - `lifecycle`: Session start and stop
//! - `dispatch`: Command dispatch

mod core;
mod dispatch;
mod lifecycle;

pub use self::core::SessionController;
