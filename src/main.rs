// HTTP control server for a single browser automation agent session.
//
// The agent runs in a bridge helper process; this binary owns the session
// and exposes start, act, stop and status over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use act_control::agent::subprocess::{BridgeConfig, SubprocessAgentFactory};
use act_control::config::{ControllerConfig, DEFAULT_API_KEY_VAR};
use act_control::server::{self, AppState, ServerConfig};
use act_control::{SessionController, capture};
use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "act-control")]
#[command(about = "HTTP control server for a browser automation agent")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ACT_CONTROL_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Bridge program that hosts the agent
    #[arg(long, env = "ACT_CONTROL_BRIDGE", value_name = "PROGRAM")]
    bridge: PathBuf,

    /// Argument for the bridge program (repeatable)
    #[arg(long = "bridge-arg", value_name = "ARG", allow_hyphen_values = true)]
    bridge_args: Vec<String>,

    /// Working directory for the bridge
    #[arg(long, env = "ACT_CONTROL_BRIDGE_CWD", value_name = "DIR")]
    bridge_cwd: Option<PathBuf>,

    /// Environment variable holding the agent API key
    #[arg(long, env = "ACT_CONTROL_API_KEY_VAR", default_value = DEFAULT_API_KEY_VAR)]
    api_key_var: String,

    /// Stop waiting for a command after this many seconds
    #[arg(long, env = "ACT_CONTROL_DISPATCH_TIMEOUT_SECS", value_name = "SECS")]
    dispatch_timeout_secs: Option<u64>,

    /// Also print captured console output to this process's streams
    #[arg(long, env = "ACT_CONTROL_ECHO_CONSOLE")]
    echo_console: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load `.env` before anything reads the environment, so it can supply
    // the API key, RUST_LOG and the ACT_CONTROL_* options
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    capture::logger::init();

    match dotenv {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Failed to load .env file: {e}"),
    }

    let config = ControllerConfig::default()
        .with_api_key_var(args.api_key_var.clone())
        .with_echo_console(args.echo_console);
    if !config.api_key_present() {
        log::warn!(
            "{} is not set; /start will fail until it is",
            args.api_key_var
        );
    }

    let mut bridge = BridgeConfig::new(args.bridge)
        .args(args.bridge_args)
        .api_key_var(args.api_key_var);
    if let Some(cwd) = args.bridge_cwd {
        bridge = bridge.cwd(cwd);
    }

    let controller = Arc::new(SessionController::new(
        config,
        SubprocessAgentFactory::new(bridge),
    ));
    let state = AppState::new(controller.clone()).with_config(ServerConfig {
        dispatch_timeout: args.dispatch_timeout_secs.map(Duration::from_secs),
    });

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;

    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {e}");
        }
        log::info!("Shutdown signal received");
    })
    .await
    .context("HTTP server error")?;

    controller.shutdown().await;
    Ok(())
}
