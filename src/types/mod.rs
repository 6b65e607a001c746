//! Type definitions shared by the controller and the HTTP boundary
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `RequestId`)
//! - [`session`] - Operation requests and responses

pub mod identifiers;
pub mod session;

pub use identifiers::{RequestId, SessionId};
pub use session::{
    DispatchRequest, DispatchResponse, StartRequest, StartResponse, StatusResponse, StopResponse,
};
