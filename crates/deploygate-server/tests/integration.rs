use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use deploygate_core::{ApprovalManager, Decision};
use deploygate_server::decisions::DecisionEvent;
use deploygate_server::dispatch::Dispatcher;
use deploygate_server::state::AppState;
use deploygate_server::{build_router, Services};
use http_body_util::BodyExt;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SECRET: &str = "test-signing-secret";

/// Router over a fresh standalone service. The manager is returned so tests
/// can inspect state directly.
fn app() -> (axum::Router, Arc<ApprovalManager>) {
    let services = Services::standalone();
    let manager = services.manager();
    (build_router(services.state), manager)
}

/// Router that verifies Slack signatures, plus the receiving end of its
/// decision queue.
fn slack_app() -> (axum::Router, Arc<ApprovalManager>, mpsc::Receiver<DecisionEvent>) {
    let (outcomes, _) = broadcast::channel(16);
    let manager = Arc::new(ApprovalManager::new(Arc::new(Dispatcher::new(
        outcomes.clone(),
    ))));
    let (tx, rx) = mpsc::channel(8);
    let state = AppState::new(manager.clone(), outcomes, tx, Some(SECRET.to_string()));
    (build_router(state), manager, rx)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a POST request with a raw body via `oneshot`.
async fn post(app: axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(
    app: axum::Router,
    req: axum::http::Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Form-encode a Slack interaction payload and sign it.
fn signed_interaction(payload: serde_json::Value, secret: &str) -> axum::http::Request<axum::body::Body> {
    let body = serde_urlencoded::to_string([("payload", payload.to_string())]).unwrap();
    let ts = chrono::Utc::now().timestamp();
    let sig = slack_notify::interaction::sign(secret, ts, body.as_bytes()).unwrap();
    axum::http::Request::builder()
        .method("POST")
        .uri("/slack/interactions")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-slack-request-timestamp", ts.to_string())
        .header("x-slack-signature", sig)
        .body(axum::body::Body::from(body))
        .unwrap()
}

fn block_actions(action_id: &str, org_id: &str, approval_id: &str) -> serde_json::Value {
    let value = deploygate_core::action::encode_value(org_id, approval_id).unwrap();
    serde_json::json!({
        "type": "block_actions",
        "user": {"id": "U1", "username": "alice"},
        "response_url": "https://hooks.slack.invalid/respond",
        "actions": [{"action_id": action_id, "value": value}]
    })
}

// ---------------------------------------------------------------------------
// Approvals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_is_pending() {
    let (app, _) = app();
    let (status, body) = post(app.clone(), "/org1/approvals", r#"{"message":"deploy?"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = get(app, &format!("/org1/approvals/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approval"]["id"], id.as_str());
    assert_eq!(body["approval"]["org_id"], "org1");
    assert_eq!(body["approval"]["status"], "pending");
    assert_eq!(body["approval"]["message"], "deploy?");
}

#[tokio::test]
async fn create_accepts_empty_body() {
    let (app, manager) = app();
    let (status, body) = post(app, "/org1/approvals", "").await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap();
    assert!(manager.get_approval("org1", id).unwrap().message.is_none());
}

#[tokio::test]
async fn create_with_malformed_body_is_400() {
    let (app, _) = app();
    let (status, body) = post(app, "/org1/approvals", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid request body"));
}

#[tokio::test]
async fn list_unknown_org_is_empty() {
    let (app, _) = app();
    for _ in 0..2 {
        let (status, body) = get(app.clone(), "/nobody/approvals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["approvals"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn list_is_scoped_by_org() {
    let (app, manager) = app();
    manager.request_approval("org1", "a", None).unwrap();
    manager.request_approval("org1", "b", None).unwrap();
    manager.request_approval("org2", "c", None).unwrap();

    let (_, body) = get(app, "/org1/approvals").await;
    let ids: Vec<&str> = body["approvals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"a") && ids.contains(&"b"));
}

#[tokio::test]
async fn get_unknown_is_404() {
    let (app, manager) = app();
    manager.request_approval("org1", "abc", None).unwrap();
    let (status, _) = get(app.clone(), "/org1/approvals/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // Right id, wrong org.
    let (status, _) = get(app, "/org2/approvals/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approve_then_reject_conflicts() {
    let (app, manager) = app();
    manager.request_approval("org1", "abc", Some("deploy?".into())).unwrap();

    let (status, body) = post(app.clone(), "/org1/approvals/abc/approve", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Approval received");
    assert_eq!(body["approval"]["status"], "approved");
    assert!(body["approval"]["resolved_at"].is_string());

    // Same decision again is a no-op success.
    let (status, _) = post(app.clone(), "/org1/approvals/abc/approve", "").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(app.clone(), "/org1/approvals/abc/reject", "").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, body) = get(app, "/org1/approvals/abc").await;
    assert_eq!(body["approval"]["status"], "approved");
}

#[tokio::test]
async fn reject_acks_with_rejection_message() {
    let (app, manager) = app();
    manager.request_approval("org1", "abc", None).unwrap();
    let (status, body) = post(app, "/org1/approvals/abc/reject", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rejection received");
    assert_eq!(body["approval"]["status"], "rejected");
}

#[tokio::test]
async fn approve_unknown_is_404() {
    let (app, _) = app();
    let (status, _) = post(app, "/org1/approvals/ghost/approve", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sse_streams_outcomes_for_the_org_only() {
    let (app, manager) = app();
    manager.request_approval("org1", "mine", None).unwrap();
    manager.request_approval("org2", "theirs", None).unwrap();

    let req = axum::http::Request::builder()
        .uri("/org1/events")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body();

    manager.approve("org2", "theirs").unwrap();
    manager.reject("org1", "mine").unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("no sse frame")
        .unwrap()
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = String::from_utf8(data.to_vec()).unwrap();
    assert!(text.contains("event: outcome"), "{text}");
    assert!(text.contains(r#""approval_id":"mine""#), "{text}");
    assert!(text.contains(r#""approved":false"#), "{text}");
    assert!(!text.contains("theirs"), "{text}");
}

// ---------------------------------------------------------------------------
// Slack interactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_click_is_queued() {
    let (app, _, mut rx) = slack_app();
    let req = signed_interaction(block_actions("deny", "org_with_underscores", "id_1"), SECRET);
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.org_id, "org_with_underscores");
    assert_eq!(event.approval_id, "id_1");
    assert_eq!(event.decision, Decision::Reject);
    assert_eq!(event.user.as_deref(), Some("alice"));
    assert_eq!(
        event.response_url.as_deref(),
        Some("https://hooks.slack.invalid/respond")
    );
}

#[tokio::test]
async fn bad_signature_is_401_and_not_queued() {
    let (app, _, mut rx) = slack_app();
    let req = signed_interaction(block_actions("approve", "org1", "abc"), "wrong-secret");
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn missing_signature_is_401() {
    let (app, _, _rx) = slack_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/slack/interactions")
        .body(axum::body::Body::from("payload=%7B%7D"))
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn minimum_timestamp_is_401() {
    let (app, _, mut rx) = slack_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/slack/interactions")
        .header("x-slack-request-timestamp", i64::MIN.to_string())
        .header("x-slack-signature", "v0=00")
        .body(axum::body::Body::from("payload=%7B%7D"))
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn undecodable_action_is_acked_and_dropped() {
    let (app, _, mut rx) = slack_app();
    let payload = serde_json::json!({
        "type": "block_actions",
        "actions": [{"action_id": "approve_org1_abc", "value": "approve_org1_abc"}]
    });
    let (status, _) = send(app, signed_interaction(payload, SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn non_button_interaction_is_acked() {
    let (app, _, mut rx) = slack_app();
    let payload = serde_json::json!({"type": "view_submission"});
    let (status, _) = send(app, signed_interaction(payload, SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// serve_on
// ---------------------------------------------------------------------------

#[tokio::test]
async fn serve_on_stops_on_shutdown() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (stop, shutdown) = tokio::sync::watch::channel(false);
    let server = tokio::spawn(deploygate_server::serve_on(
        listener,
        Services::standalone(),
        shutdown,
    ));

    stop.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not shut down")
        .unwrap()
        .unwrap();
}
