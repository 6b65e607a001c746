//! Route handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::types::{
    DispatchRequest, DispatchResponse, StartRequest, StartResponse, StatusResponse, StopResponse,
};

use super::AppState;
use super::error::ApiError;

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always true
    pub ok: bool,
}

/// Body of `GET /env`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvResponse {
    /// Environment variable the credential is read from, if any
    pub api_key_var: Option<String>,
    /// Whether a non-blank credential is available
    pub api_key_present: bool,
    /// Masked form of the credential
    pub api_key_masked: Option<String>,
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

pub(super) async fn env(State(state): State<AppState>) -> Json<EnvResponse> {
    let config = state.controller.config();
    Json(EnvResponse {
        api_key_var: config.credentials.env_var().map(str::to_string),
        api_key_present: config.api_key_present(),
        api_key_masked: config.masked_api_key(),
    })
}

pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.controller.status())
}

/// `POST /start`; an empty body means "use the defaults"
///
/// Runs on its own task, like `/act`, so a dropped connection never cancels
/// the agent's start halfway.
pub(super) async fn start(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StartResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };
    let controller = state.controller.clone();
    let task = tokio::spawn(async move { controller.start(request).await });
    Ok(Json(joined(task).await?))
}

/// `POST /act`
///
/// The command runs on its own task so a client that goes away, or a
/// dispatch timeout, never cancels the agent mid-command.
pub(super) async fn act(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    if request.command.trim().is_empty() {
        return Err(ApiError::EmptyCommand);
    }

    let controller = state.controller.clone();
    let task = tokio::spawn(async move { controller.dispatch(&request.command).await });

    let finished = match state.config.dispatch_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| ApiError::Timeout(limit))?,
        None => task.await,
    };

    let response = finished.map_err(|e| ApiError::Task(e.to_string()))??;
    Ok(Json(response))
}

/// `POST /stop`, detached from the connection like `/start`
pub(super) async fn stop(State(state): State<AppState>) -> Result<Json<StopResponse>, ApiError> {
    let controller = state.controller.clone();
    let task = tokio::spawn(async move { controller.stop().await });
    Ok(Json(joined(task).await?))
}

/// Wait for a spawned controller call
async fn joined<T>(task: JoinHandle<crate::error::Result<T>>) -> Result<T, ApiError> {
    let outcome = task.await.map_err(|e| ApiError::Task(e.to_string()))?;
    Ok(outcome?)
}
