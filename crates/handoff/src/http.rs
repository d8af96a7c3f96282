// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for the Handoff service, built on axum.
//!
//! Three route groups share one engine: the widget API used by the embedded
//! chat client (session-authenticated in the request body or query string),
//! the tool endpoint the in-process agent calls mid-conversation, and the
//! internal operator surface. Transport is the only concern here; all
//! authorization and state-machine rules live in the engine.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use handoff_core::{HandoffError, ThreadMessage};
use handoff_engine::{ConversationEngine, ConversationSummary, EscalateOutcome};
use handoff_storage::models::{ContactSession, Conversation};

/// Default page size for conversation listings.
const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AppState {
    pub engine: ConversationEngine,
}

pub fn router(engine: ConversationEngine) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/health", get(get_health))
        .route("/widget/sessions", post(post_session))
        .route(
            "/widget/conversations",
            post(post_conversation).get(get_conversations),
        )
        .route("/widget/conversations/{id}", get(get_conversation))
        .route(
            "/widget/conversations/{id}/messages",
            get(get_conversation_messages),
        )
        .route(
            "/widget/conversations/{id}/escalate",
            post(post_escalate_conversation),
        )
        .route("/tools/escalate", post(post_tool_escalate))
        .route("/internal/conversations/resolve", post(post_resolve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Engine error mapped onto an HTTP status with a JSON body.
pub struct ApiError(HandoffError);

impl From<HandoffError> for ApiError {
    fn from(err: HandoffError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            HandoffError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            HandoffError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            HandoffError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.0.to_string()),
            _ => {
                // Internals stay in the log, not the response body.
                error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    pub email: String,
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Option<String>,
}

async fn post_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ContactSession>), ApiError> {
    let session = state
        .engine
        .create_contact_session(&body.name, &body.email, &body.organization_id, body.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub organization_id: String,
    pub contact_session_id: String,
}

async fn post_conversation(
    State(state): State<AppState>,
    Json(body): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    let conversation = state
        .engine
        .create_conversation(&body.organization_id, &body.contact_session_id)
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub contact_session_id: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConversationSummaryResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<ThreadMessage>,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            conversation: summary.conversation,
            last_message: summary.last_message,
        }
    }
}

async fn get_conversations(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<ConversationSummaryResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 200);
    let summaries = state
        .engine
        .list_for_session(&query.contact_session_id, limit)
        .await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .engine
        .get_for_session(&id, &query.contact_session_id)
        .await?;
    Ok(Json(conversation))
}

async fn get_conversation_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<ThreadMessage>>, ApiError> {
    let messages = state
        .engine
        .conversation_messages(&id, &query.contact_session_id)
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub contact_session_id: String,
    #[serde(default)]
    pub last_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EscalateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_escalated: Option<bool>,
}

impl From<EscalateOutcome> for EscalateResponse {
    fn from(outcome: EscalateOutcome) -> Self {
        match outcome {
            EscalateOutcome::Escalated => EscalateResponse {
                success: Some(true),
                already_escalated: None,
            },
            EscalateOutcome::AlreadyEscalated => EscalateResponse {
                success: None,
                already_escalated: Some(true),
            },
        }
    }
}

async fn post_escalate_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EscalateRequest>,
) -> Result<Json<EscalateResponse>, ApiError> {
    let outcome = state
        .engine
        .escalate_for_customer(&id, &body.contact_session_id, body.last_message)
        .await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct ThreadRequest {
    pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub result: String,
}

/// The tool surface answers with confirmation text rather than status
/// codes: the calling agent relays `result` into its own tool-use loop, so
/// expected failures read as sentences, not errors.
async fn post_tool_escalate(
    State(state): State<AppState>,
    Json(body): Json<ThreadRequest>,
) -> Result<Json<ToolResponse>, ApiError> {
    let result = match state.engine.escalate_for_agent(&body.thread_id).await {
        Ok(EscalateOutcome::Escalated) => "Conversation escalated to a human operator.",
        Ok(EscalateOutcome::AlreadyEscalated) => "Conversation has already been escalated.",
        Err(HandoffError::NotFound { .. }) => "Conversation not found.",
        Err(HandoffError::InvalidTransition { .. }) => {
            "Conversation is already resolved and cannot be escalated."
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(ToolResponse {
        result: result.to_string(),
    }))
}

async fn post_resolve(
    State(state): State<AppState>,
    Json(body): Json<ThreadRequest>,
) -> Result<StatusCode, ApiError> {
    state.engine.resolve_by_thread(&body.thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
