//! HTTP channel — serves the question-routing API over axum.
//!
//! [`serve`] drives the listener until the shared [`CancellationToken`] is
//! cancelled; Ctrl-C in `main` flows into axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! POST   /ask
//! GET    /sessions
//! GET    /sessions/{session_id}
//! DELETE /sessions/{session_id}
//! GET    /health
//! (anything else)            → 404 {"error": "Endpoint not found"}
//! ```

mod api;
pub mod error;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::error::AppError;
use crate::service::ChatService;

// ── Shared request state ─────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
/// Cheap to clone — the service is reference-counted.
#[derive(Clone)]
pub(crate) struct AppState {
    pub service: Arc<ChatService>,
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router around a service instance.
///
/// Public so integration tests can drive the stack without a socket.
pub fn build_router(service: Arc<ChatService>) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/ask", post(api::ask))
        .route("/sessions", get(api::sessions))
        .route(
            "/sessions/{session_id}",
            get(api::session_detail).delete(api::delete_session),
        )
        .route("/health", get(api::health))
        .fallback(api::not_found)
        .with_state(state)
}

// ── Server loop ──────────────────────────────────────────────────────────────

/// Bind and serve until `shutdown` is cancelled.
pub async fn serve(
    bind_addr: &str,
    service: Arc<ChatService>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(service);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http channel listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("server error: {e}")))?;

    info!("http channel shut down");
    Ok(())
}
