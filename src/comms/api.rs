//! Axum handlers for the API routes.
//!
//! Each handler receives [`AppState`] via [`axum::extract::State`], delegates
//! to the [`ChatService`](crate::service::ChatService), and serialises the
//! outcome. Error mapping lives in [`super::error::ApiError`].

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::AppState;
use super::error::ApiError;
use crate::service::{HealthStatus, QuestionReply};

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct AskRequest {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /ask
pub(super) async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<QuestionReply>, ApiError> {
    let question = req.question.unwrap_or_default();
    debug!(has_session = req.session_id.is_some(), "ask request received");
    let reply = state.service.handle_question(req.session_id, &question).await?;
    Ok(Json(reply))
}

/// GET /sessions
pub(super) async fn sessions(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.service.list_sessions().await;
    let total = sessions.len();
    Json(json!({
        "sessions": sessions,
        "total_sessions": total,
    }))
}

/// GET /sessions/{session_id}
pub(super) async fn session_detail(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let snap = state.service.session_detail(&session_id).await?;
    Ok(Json(json!({
        "session_id": snap.session_id,
        "created_at": snap.created_at,
        "conversation_history": snap.transcript,
    })))
}

/// DELETE /sessions/{session_id}
pub(super) async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_session(&session_id).await?;
    Ok(Json(json!({
        "message": format!("Session {session_id} deleted successfully"),
    })))
}

/// GET /health
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health().await)
}

/// Any unmatched route.
pub(super) async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
