//! Tests for `SubprocessAgent`
//!
//! Runs a small shell bridge that speaks the line protocol.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use std::path::Path;
use std::sync::Arc;

use act_control::agent::subprocess::{
    BRIDGE_LOG_TARGET, BridgeConfig, SubprocessAgent, SubprocessAgentFactory,
};
use act_control::agent::{Agent, AgentFactory, LaunchOptions};
use act_control::{
    AgentError, CaptureOptions, ControllerConfig, SessionController, SessionError, SessionPhase,
    StartRequest, with_capture,
};
use common::serial;
use serde_json::json;
use tempfile::TempDir;

const BRIDGE_SCRIPT: &str = r#"
field() {
    printf '%s\n' "$1" | sed -n "s/.*\"$2\":\"\([^\"]*\)\".*/\1/p"
}

while IFS= read -r line; do
    id=$(field "$line" id)
    op=$(field "$line" op)
    case "$op" in
        start)
            if [ "$BRIDGE_KEY" != "good-key" ]; then
                printf '{"type":"response","id":"%s","ok":false,"error":{"kind":"authentication","message":"key rejected"}}\n' "$id"
                continue
            fi
            echo "plain text from bridge"
            echo '{"type":"log","level":"INFO","target":"browser","message":"browser launched"}'
            printf '{"type":"response","id":"%s","ok":true,"session_id":"bridge-session","logs_location":"/tmp/bridge-logs"}\n' "$id"
            ;;
        act)
            command=$(field "$line" command)
            printf '{"type":"console","stream":"stdout","text":"acting on %s\\n"}\n' "$command"
            case "$command" in
                crash) exit 3 ;;
                noisy*)
                    echo "stderr for $command" >&2
                    printf '{"type":"response","id":"%s","ok":true,"value":null}\n' "$id"
                    ;;
                long)
                    printf '%0400d\n' 0
                    printf '{"type":"response","id":"%s","ok":true,"value":"after long line"}\n' "$id"
                    ;;
                fail) printf '{"type":"response","id":"%s","ok":false,"error":{"kind":"failure","message":"could not act"}}\n' "$id" ;;
                *) printf '{"type":"response","id":"%s","ok":true,"value":{"echo":"%s"}}\n' "$id" "$command" ;;
            esac
            ;;
        stop)
            echo "bridge shutting down" >&2
            printf '{"type":"response","id":"stale-request","ok":true}\n'
            printf '{"type":"response","id":"%s","ok":true}\n' "$id"
            exit 0
            ;;
    esac
done
"#;

/// Write the bridge script into a temp dir and configure `sh` to run it
fn bridge() -> (TempDir, BridgeConfig) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("bridge.sh");
    std::fs::write(&script, BRIDGE_SCRIPT).unwrap();
    let config = BridgeConfig::new("sh")
        .arg(path_arg(&script))
        .api_key_var("BRIDGE_KEY");
    (dir, config)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn launch(api_key: &str) -> LaunchOptions {
    LaunchOptions {
        starting_page: "https://example.com".to_string(),
        headless: true,
        api_key: api_key.to_string(),
    }
}

#[tokio::test]
async fn test_bridge_start_act_stop() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let mut agent = SubprocessAgentFactory::new(config)
        .create(&launch("good-key"))
        .unwrap();

    let (started, telemetry) = with_capture(CaptureOptions::default(), agent.start()).await;
    started.unwrap();
    assert_eq!(agent.session_id().as_deref(), Some("bridge-session"));
    assert_eq!(agent.logs_location().as_deref(), Some("/tmp/bridge-logs"));
    assert!(telemetry.console_text.contains("plain text from bridge\n"));
    let entry = telemetry
        .log_entries
        .iter()
        .find(|entry| entry.target == BRIDGE_LOG_TARGET)
        .unwrap();
    assert_eq!(entry.level, log::Level::Info);
    assert_eq!(entry.message, "[browser] browser launched");

    let (value, telemetry) =
        with_capture(CaptureOptions::default(), agent.act("search")).await;
    assert_eq!(value.unwrap(), json!({"echo": "search"}));
    assert_eq!(telemetry.console_text, "acting on search\n");

    let (stopped, telemetry) = with_capture(CaptureOptions::default(), agent.stop()).await;
    stopped.unwrap();
    assert!(telemetry.console_text.contains("bridge shutting down"));
}

#[tokio::test]
async fn test_bridge_command_failure() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let mut agent = SubprocessAgentFactory::new(config)
        .create(&launch("good-key"))
        .unwrap();
    agent.start().await.unwrap();

    let err = agent.act("fail").await.unwrap_err();
    assert!(matches!(err, AgentError::Failed(ref detail) if detail == "could not act"));

    // The bridge is still usable after a failed command
    assert_eq!(agent.act("again").await.unwrap(), json!({"echo": "again"}));
    agent.stop().await.unwrap();
}

#[tokio::test]
async fn test_bridge_exit_before_response() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let mut agent = SubprocessAgentFactory::new(config)
        .create(&launch("good-key"))
        .unwrap();
    agent.start().await.unwrap();

    let err = agent.act("crash").await.unwrap_err();
    assert!(!err.is_authentication());
    assert!(err.detail().contains("exited before answering"));
}

#[tokio::test]
async fn test_rejected_key_through_controller() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let controller = SessionController::new(
        ControllerConfig::default().with_api_key(Some("wrong-key")),
        SubprocessAgentFactory::new(config),
    );

    let err = controller.start(StartRequest::default()).await.unwrap_err();
    assert!(matches!(err, SessionError::Authentication { ref detail, .. } if detail == "key rejected"));
    assert_eq!(controller.status().phase, SessionPhase::Absent);
}

#[tokio::test]
async fn test_controller_drives_bridge() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let controller = Arc::new(SessionController::new(
        ControllerConfig::default().with_api_key(Some("good-key")),
        SubprocessAgentFactory::new(config),
    ));

    let started = controller.start(StartRequest::default()).await.unwrap();
    assert_eq!(started.session_id.unwrap().as_str(), "bridge-session");

    let response = controller.dispatch("find shoes").await.unwrap();
    assert_eq!(response.result, json!({"echo": "find shoes"}));
    assert_eq!(response.telemetry.console_text, "acting on find shoes\n");

    let stopped = controller.stop().await.unwrap();
    assert!(stopped.stopped);
    assert_eq!(controller.status().phase, SessionPhase::Absent);
}

#[tokio::test]
async fn test_agent_connects_on_start_and_disconnects_on_stop() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let factory = SubprocessAgentFactory::new(config);
    let mut agent = SubprocessAgent::new(factory.config().clone(), launch("good-key")).unwrap();

    assert!(!agent.is_connected());
    agent.start().await.unwrap();
    assert!(agent.is_connected());
    agent.stop().await.unwrap();
    assert!(!agent.is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bridge_stderr_stays_with_its_dispatch() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let controller = SessionController::new(
        ControllerConfig::default().with_api_key(Some("good-key")),
        SubprocessAgentFactory::new(config),
    );
    controller.start(StartRequest::default()).await.unwrap();

    for n in 0..30 {
        let command = format!("noisy-{n}");
        let response = controller.dispatch(&command).await.unwrap();
        let console = &response.telemetry.console_text;
        assert_eq!(
            console.matches(&format!("stderr for {command}\n")).count(),
            1,
            "dispatch {n} console: {console:?}"
        );
        assert_eq!(
            console.matches("stderr for").count(),
            1,
            "dispatch {n} console: {console:?}"
        );
    }

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_oversized_line_is_skipped() {
    let _serial = serial().await;
    let (_dir, config) = bridge();
    let mut agent = SubprocessAgentFactory::new(config.max_frame_size(256))
        .create(&launch("good-key"))
        .unwrap();
    agent.start().await.unwrap();

    let (value, telemetry) = with_capture(CaptureOptions::default(), agent.act("long")).await;
    assert_eq!(value.unwrap(), json!("after long line"));
    assert_eq!(telemetry.console_text, "acting on long\n");

    // The pipe stays usable afterwards
    assert_eq!(agent.act("next").await.unwrap(), json!({"echo": "next"}));
    agent.stop().await.unwrap();
}

#[test]
fn test_missing_program_fails_at_construction() {
    let config = BridgeConfig::new("definitely-not-a-real-bridge-program");
    let err = SubprocessAgentFactory::new(config)
        .create(&launch("good-key"))
        .err()
        .unwrap();
    assert!(err.detail().contains("not found"));
}
