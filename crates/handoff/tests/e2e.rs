// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the HTTP surface.
//!
//! Each test builds the full router over an isolated temp SQLite database
//! and drives it with in-process requests. Tests are independent and
//! order-insensitive.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use handoff_config::HandoffConfig;
use handoff_engine::ConversationEngine;
use handoff_notify::QueueDispatcher;
use handoff_storage::{Database, SqliteThreads, queries};

struct Harness {
    app: Router,
    db: Database,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("test.db").to_str().unwrap())
        .await
        .unwrap();
    let threads = Arc::new(SqliteThreads::new(db.clone()));
    let dispatcher = Arc::new(QueueDispatcher::new(db.clone()));
    let engine = ConversationEngine::new(
        db.clone(),
        threads,
        dispatcher,
        &HandoffConfig::default(),
    );
    Harness {
        app: handoff::http::router(engine),
        db,
        _dir: dir,
    }
}

impl Harness {
    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_session(&self) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/widget/sessions",
                Some(json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "organization_id": "org-1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn create_conversation(&self, session_id: &str) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/widget/conversations",
                Some(json!({
                    "organization_id": "org-1",
                    "contact_session_id": session_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness().await;
    let (status, body) = h.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn widget_flow_creates_session_and_conversation() {
    let h = harness().await;
    let session = h.create_session().await;
    assert_eq!(session["organization_id"], "org-1");

    let conversation = h.create_conversation(session["id"].as_str().unwrap()).await;
    assert_eq!(conversation["status"], "unresolved");
    assert!(conversation["escalated_at"].is_null());

    // The new thread starts with the assistant greeting.
    let uri = format!(
        "/widget/conversations/{}/messages?contact_session_id={}",
        conversation["id"].as_str().unwrap(),
        session["id"].as_str().unwrap()
    );
    let (status, messages) = h.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["role"], "assistant");
    assert_eq!(messages[0]["content"], "Hello, how can I help you today?");
}

#[tokio::test]
async fn escalation_lifecycle_over_http() {
    let h = harness().await;
    let session = h.create_session().await;
    let session_id = session["id"].as_str().unwrap().to_string();
    let conversation = h.create_conversation(&session_id).await;
    let conversation_id = conversation["id"].as_str().unwrap().to_string();
    let thread_id = conversation["thread_id"].as_str().unwrap().to_string();

    // First escalation wins.
    let uri = format!("/widget/conversations/{conversation_id}/escalate");
    let (status, body) = h
        .request(
            "POST",
            &uri,
            Some(json!({
                "contact_session_id": session_id,
                "last_message": "I want to talk to a person",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    // A second trigger, from the tool surface, is a quiet no-op.
    let (status, body) = h
        .request("POST", "/tools/escalate", Some(json!({ "thread_id": thread_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Conversation has already been escalated.");

    // Exactly one notification job was enqueued.
    assert!(queries::jobs::claim_next_job(&h.db).await.unwrap().is_some());
    assert!(queries::jobs::claim_next_job(&h.db).await.unwrap().is_none());

    // Resolve, then a further escalation conflicts.
    let (status, _) = h
        .request(
            "POST",
            "/internal/conversations/resolve",
            Some(json!({ "thread_id": thread_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = h
        .request(
            "POST",
            &uri,
            Some(json!({ "contact_session_id": session_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("resolved"));

    // The conversation keeps its escalation metadata after resolve.
    let get_uri =
        format!("/widget/conversations/{conversation_id}?contact_session_id={session_id}");
    let (status, body) = h.request("GET", &get_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
    assert_eq!(body["escalation_reason"], "customer_requested");
    assert!(!body["escalated_at"].is_null());
}

#[tokio::test]
async fn invalid_session_is_unauthorized() {
    let h = harness().await;
    let (status, body) = h
        .request(
            "POST",
            "/widget/conversations",
            Some(json!({
                "organization_id": "org-1",
                "contact_session_id": "no-such-session",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("unauthorized"));
}

#[tokio::test]
async fn foreign_session_cannot_read_a_conversation() {
    let h = harness().await;
    let owner = h.create_session().await;
    let stranger = h.create_session().await;
    let conversation = h.create_conversation(owner["id"].as_str().unwrap()).await;

    let uri = format!(
        "/widget/conversations/{}?contact_session_id={}",
        conversation["id"].as_str().unwrap(),
        stranger["id"].as_str().unwrap()
    );
    let (status, _) = h.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let h = harness().await;
    let session = h.create_session().await;
    let uri = format!(
        "/widget/conversations/no-such-id?contact_session_id={}",
        session["id"].as_str().unwrap()
    );
    let (status, _) = h.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tool_escalate_answers_in_confirmation_text() {
    let h = harness().await;

    // Unknown threads come back as text for the agent, not as an HTTP error.
    let (status, body) = h
        .request(
            "POST",
            "/tools/escalate",
            Some(json!({ "thread_id": "no-such-thread" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Conversation not found.");

    // First escalation over the tool surface confirms the handoff.
    let session = h.create_session().await;
    let conversation = h.create_conversation(session["id"].as_str().unwrap()).await;
    let (status, body) = h
        .request(
            "POST",
            "/tools/escalate",
            Some(json!({ "thread_id": conversation["thread_id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Conversation escalated to a human operator.");
}

#[tokio::test]
async fn listing_returns_newest_first_with_last_message() {
    let h = harness().await;
    let session = h.create_session().await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let first = h.create_conversation(&session_id).await;
    let second = h.create_conversation(&session_id).await;

    let uri = format!("/widget/conversations?contact_session_id={session_id}");
    let (status, body) = h.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], second["id"]);
    assert_eq!(listed[1]["id"], first["id"]);
    assert_eq!(
        listed[0]["last_message"]["content"],
        "Hello, how can I help you today?"
    );
}
