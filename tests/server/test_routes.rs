//! Tests for the HTTP routes
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use act_control::server::{self, AppState, ServerConfig};
use act_control::{ControllerConfig, SessionController};
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use common::{Script, StartFailure, StubFactory, serial};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(script: Script) -> axum::Router {
    let (controller, _recorder) = common::controller(script);
    server::router(AppState::new(controller))
}

async fn call(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = app(Script::default());
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_env_masks_key() {
    let app = app(Script::default());
    let (status, body) = call(&app, Method::GET, "/env", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_key_present"], true);
    assert_eq!(body["api_key_masked"], "test…3456");
    assert_eq!(body["api_key_var"], Value::Null);
}

#[tokio::test]
async fn test_full_session_over_http() {
    let _serial = serial().await;
    let app = app(Script::default());

    let (status, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "absent");
    assert_eq!(body["running"], false);

    let (status, body) = call(
        &app,
        Method::POST,
        "/start",
        Some(json!({"starting_page": "https://example.com", "headless": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], true);
    assert_eq!(body["session_id"], "stub-session");
    assert_eq!(body["headless"], false);
    assert!(
        body["telemetry"]["console_text"]
            .as_str()
            .unwrap()
            .contains("starting browser on https://example.com")
    );

    let (status, body) = call(
        &app,
        Method::POST,
        "/act",
        Some(json!({"command": "search for X"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "done");
    assert_eq!(body["telemetry"]["console_text"], "searching for X\n");

    let (status, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "running");
    assert_eq!(body["capabilities"], json!({"stop": true, "close": false}));

    let (status, body) = call(&app, Method::POST, "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopped"], true);

    let (status, body) = call(&app, Method::POST, "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopped"], false);
}

#[tokio::test]
async fn test_start_with_empty_body_uses_defaults() {
    let _serial = serial().await;
    let app = app(Script::default());

    let (status, body) = call(&app, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["starting_page"], "https://www.amazon.com");
    assert_eq!(body["headless"], true);

    call(&app, Method::POST, "/stop", None).await;
}

#[tokio::test]
async fn test_start_with_malformed_body_is_rejected() {
    let _serial = serial().await;
    let app = app(Script::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/start")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(body["phase"], "absent");
}

#[tokio::test]
async fn test_act_without_session_is_bad_request() {
    let _serial = serial().await;
    let app = app(Script::default());

    let (status, body) = call(&app, Method::POST, "/act", Some(json!({"command": "go"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_running_error");
    assert!(body.get("telemetry").is_none());
}

#[tokio::test]
async fn test_empty_command_is_unprocessable() {
    let _serial = serial().await;
    let app = app(Script::default());

    let (status, body) = call(&app, Method::POST, "/act", Some(json!({"command": "  "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_missing_credential_is_unauthorized() {
    let _serial = serial().await;
    let (factory, recorder) = StubFactory::new(Script::default());
    let config = ControllerConfig::default().with_api_key(None::<String>);
    let app = server::router(AppState::new(Arc::new(SessionController::new(
        config, factory,
    ))));

    let (status, body) = call(&app, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "configuration_error");
    assert_eq!(recorder.created(), 0);

    let (_, body) = call(&app, Method::GET, "/env", None).await;
    assert_eq!(body["api_key_present"], false);
    assert_eq!(body["api_key_masked"], Value::Null);
}

#[tokio::test]
async fn test_start_failures_map_to_status_codes() {
    let _serial = serial().await;

    let app_auth = app(Script {
        start_failure: Some(StartFailure::Authentication("bad key".to_string())),
        ..Script::default()
    });
    let (status, body) = call(&app_auth, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_error");
    assert_eq!(body["detail"], "bad key");

    let app_crash = app(Script {
        start_failure: Some(StartFailure::Other("browser crashed".to_string())),
        ..Script::default()
    });
    let (status, body) = call(&app_crash, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "startup_error");
    assert!(
        body["telemetry"]["console_text"]
            .as_str()
            .unwrap()
            .contains("starting browser")
    );
}

#[tokio::test]
async fn test_failed_command_returns_telemetry() {
    let _serial = serial().await;
    let app = app(Script::default());
    call(&app, Method::POST, "/start", None).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/act",
        Some(json!({"command": "fail to click"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "dispatch_error");
    assert_eq!(body["detail"], "element not found");
    assert!(
        body["telemetry"]["console_text"]
            .as_str()
            .unwrap()
            .contains("error: no such element")
    );

    let (_, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(body["phase"], "running");

    call(&app, Method::POST, "/stop", None).await;
}

#[tokio::test]
async fn test_dispatch_timeout_leaves_command_running() {
    let _serial = serial().await;
    let (controller, recorder) = common::controller(Script {
        act_delay: Duration::from_millis(200),
        ..Script::default()
    });
    let app = server::router(AppState::new(controller.clone()).with_config(ServerConfig {
        dispatch_timeout: Some(Duration::from_millis(20)),
    }));
    call(&app, Method::POST, "/start", None).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/act",
        Some(json!({"command": "slow search"})),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "timeout_error");

    // The command finishes in the background; stop waits for it
    controller.stop().await.unwrap();
    assert_eq!(
        recorder.events(),
        vec!["start", "enter:slow search", "exit:slow search", "stop"]
    );
}

#[tokio::test]
async fn test_abandoned_start_request_still_starts() {
    let _serial = serial().await;
    let (controller, recorder) = common::controller(Script {
        start_delay: Duration::from_millis(100),
        ..Script::default()
    });
    let app = server::router(AppState::new(controller.clone()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/start")
        .body(Body::empty())
        .unwrap();
    let client = tokio::spawn(app.clone().oneshot(request));
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.abort();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (_, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(body["phase"], "running");
    assert_eq!(recorder.created(), 1);

    let (status, body) = call(&app, Method::POST, "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopped"], true);
}
