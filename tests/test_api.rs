//! End-to-end tests for the HTTP API.
//!
//! Each test builds a fresh router around a scripted capability and drives
//! it in-process via `tower::ServiceExt::oneshot` — no sockets, no real LLM.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use switchboard::comms::build_router;
use switchboard::llm::LlmProvider;
use switchboard::llm::providers::scripted::ScriptedProvider;
use switchboard::service::ChatService;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Fresh app with its own scripted capability and empty session store.
fn make_app() -> (ScriptedProvider, Router) {
    let capability = ScriptedProvider::new();
    let service = Arc::new(ChatService::new(LlmProvider::Scripted(capability.clone())));
    (capability, build_router(service))
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

/// Read and parse the full response body.
async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── /health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_happy_path() {
    let (_capability, app) = make_app();

    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["active_sessions"], 0);
    assert!(body["timestamp"].is_string());
}

// ── /ask ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_routes_to_knowledge_base_and_records_transcript() {
    let (capability, app) = make_app();
    capability.push_decision(
        r#"{"tool": "knowledge_base", "reasoning": "company policy question", "query": "refund policy"}"#,
    );
    capability.push_answer("Refunds are accepted within 30 days.");

    let resp = app
        .clone()
        .oneshot(post_json("/ask", r#"{"question": "What is our refund policy?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["question"], "What is our refund policy?");
    assert_eq!(body["response"], "Refunds are accepted within 30 days.");
    assert_eq!(body["tool_used"], "knowledge_base");
    assert_eq!(body["reasoning"], "company policy question");
    assert!(body["timestamp"].is_string());

    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.len(), 36, "expected a generated UUID");

    // the transcript now holds exactly [user, assistant]
    let resp = app
        .clone()
        .oneshot(get(&format!("/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let history = body["conversation_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "What is our refund policy?");
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["content"], "Refunds are accepted within 30 days.");

    // and the session shows up in the listing
    let resp = app.oneshot(get("/sessions")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total_sessions"], 1);
    assert_eq!(body["sessions"][0]["session_id"], session_id.as_str());
    assert_eq!(body["sessions"][0]["message_count"], 2);
}

#[tokio::test]
async fn ask_reuses_provided_session_id() {
    let (capability, app) = make_app();
    for _ in 0..2 {
        capability.push_decision(r#"{"tool": "web_search"}"#);
    }
    capability.push_answer("first");
    capability.push_answer("second");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/ask",
            r#"{"question": "one", "session_id": "my-session"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["session_id"], "my-session");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/ask",
            r#"{"question": "two", "session_id": "my-session"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get("/sessions/my-session")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["conversation_history"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn ask_falls_back_to_web_search_when_routing_breaks() {
    let (capability, app) = make_app();
    capability.push_decision_error("capability unavailable");
    capability.push_answer("best effort");

    let resp = app
        .oneshot(post_json("/ask", r#"{"question": "anything"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["tool_used"], "web_search");
    assert_eq!(body["reasoning"], "Fallback due to routing error");
    assert_eq!(body["response"], "best effort");
}

#[tokio::test]
async fn ask_empty_question_is_bad_request() {
    let (_capability, app) = make_app();

    let resp = app
        .clone()
        .oneshot(post_json("/ask", r#"{"question": "   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No question provided");

    // missing field behaves the same
    let resp = app.clone().oneshot(post_json("/ask", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // and no session was created along the way
    let resp = app.oneshot(get("/sessions")).await.unwrap();
    assert_eq!(body_json(resp).await["total_sessions"], 0);
}

#[tokio::test]
async fn ask_malformed_body_is_client_error() {
    let (_capability, app) = make_app();

    let resp = app
        .oneshot(post_json("/ask", "{not json"))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

// ── /sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (_capability, app) = make_app();

    let resp = app
        .clone()
        .oneshot(get("/sessions/unknown-id"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Session not found");

    let resp = app.oneshot(delete("/sessions/unknown-id")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_session_round_trip() {
    let (capability, app) = make_app();
    capability.push_decision(r#"{"tool": "web_search"}"#);
    capability.push_answer("ok");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/ask",
            r#"{"question": "hello", "session_id": "doomed"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(delete("/sessions/doomed")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["message"],
        "Session doomed deleted successfully"
    );

    let resp = app.clone().oneshot(get("/sessions/doomed")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(get("/sessions")).await.unwrap();
    assert_eq!(body_json(resp).await["total_sessions"], 0);
}

// ── Fallback route ───────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_endpoint_is_not_found() {
    let (_capability, app) = make_app();

    let resp = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Endpoint not found");
}
