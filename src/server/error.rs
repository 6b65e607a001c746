//! HTTP error mapping

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CapturedTelemetry;
use crate::error::SessionError;

/// Errors returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Controller operation failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Command text is empty or whitespace
    #[error("Command must not be empty")]
    EmptyCommand,

    /// Request body could not be decoded
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The caller stopped waiting; the command keeps running
    #[error("Command did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The task running the command panicked or was cancelled
    #[error("Command task failed: {0}")]
    Task(String),
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable snake_case error kind
    pub error: String,
    /// Human-readable detail
    pub detail: String,
    /// Output captured before the failure, when the agent was reached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<CapturedTelemetry>,
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(err) => match err {
                SessionError::Configuration(_) | SessionError::Authentication { .. } => {
                    StatusCode::UNAUTHORIZED
                }
                SessionError::NotRunning => StatusCode::BAD_REQUEST,
                SessionError::Startup { .. }
                | SessionError::Dispatch { .. }
                | SessionError::Stop { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::EmptyCommand | Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable snake_case kind reported in the body
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session(err) => err.kind(),
            Self::EmptyCommand | Self::InvalidBody(_) => "validation_error",
            Self::Timeout(_) => "timeout_error",
            Self::Task(_) => "internal_error",
        }
    }

    fn into_body(self) -> ErrorBody {
        let error = self.kind().to_string();
        match self {
            Self::Session(err) => ErrorBody {
                error,
                detail: err.detail(),
                telemetry: err.telemetry().cloned(),
            },
            other => ErrorBody {
                error,
                detail: other.to_string(),
                telemetry: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::debug!("Request rejected: {self}");
        }
        (status, Json(self.into_body())).into_response()
    }
}
