//! HTTP boundary
//!
//! Thin axum layer over [`SessionController`]: every route maps onto one
//! controller operation and serializes its result or error as JSON.

mod error;
mod routes;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::manager::SessionController;

pub use error::{ApiError, ErrorBody};
pub use routes::{EnvResponse, HealthResponse};

/// Settings of the HTTP layer itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerConfig {
    /// Stop waiting for `/act` after this long; the command keeps running
    pub dispatch_timeout: Option<Duration>,
}

/// Shared state for route handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session controller
    pub controller: Arc<SessionController>,
    /// HTTP layer settings
    pub config: ServerConfig,
}

impl AppState {
    /// State with default server settings
    #[must_use]
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self {
            controller,
            config: ServerConfig::default(),
        }
    }

    /// Replace the server settings
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/env", get(routes::env))
        .route("/status", get(routes::status))
        .route("/start", post(routes::start))
        .route("/act", post(routes::act))
        .route("/stop", post(routes::stop))
        .with_state(state)
}

/// Serve until `shutdown` resolves
///
/// # Errors
/// Returns error if the server fails while accepting connections
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
