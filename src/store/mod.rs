//! In-memory conversation store — per-session transcripts keyed by opaque id.
//!
//! Two-level locking: an outer `RwLock` guards the session map (held only for
//! lookup, insert, remove) and each session carries its own `Mutex` so
//! appends to one session serialise without blocking traffic on any other.
//! Nothing here is held across a capability call — callers append only after
//! the LLM round-trip has finished.
//!
//! Sessions live until explicit deletion or process exit. There is no TTL
//! and no transcript cap, matching the reference behaviour; long-running
//! deployments grow without bound (see DESIGN.md).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
}

// ── Message ──────────────────────────────────────────────────────────────────

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Immutable transcript entry. Transcripts are append-only and chronological;
/// strict user/assistant alternation is NOT assumed — a client may send two
/// user messages in a row and the store takes them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// ── Session views ────────────────────────────────────────────────────────────

/// Listing entry for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Full read view of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<Message>,
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Per-session mutable state. Owned exclusively by the store entry.
#[derive(Debug)]
struct SessionState {
    created_at: DateTime<Utc>,
    transcript: Vec<Message>,
}

/// Keyed collection of session transcripts.
///
/// Ids are opaque exact-match strings; the store never validates their
/// format. Constructed once at startup and shared via `Arc`.
#[derive(Debug, Default)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `session_id`, creating it with an empty
    /// transcript on first reference. Idempotent: repeated and concurrent
    /// calls yield one session with one fixed `created_at`.
    pub async fn get_or_create(&self, session_id: &str) -> SessionSummary {
        // Fast path: session already exists, shared lock suffices.
        if let Some(entry) = self.sessions.read().await.get(session_id).cloned() {
            let state = entry.lock().await;
            return SessionSummary {
                session_id: session_id.to_string(),
                created_at: state.created_at,
                message_count: state.transcript.len(),
            };
        }

        // Check-or-create under the exclusive lock; `entry` keeps two racing
        // writers from creating two distinct sessions.
        let mut map = self.sessions.write().await;
        let entry = map
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionState {
                    created_at: Utc::now(),
                    transcript: Vec::new(),
                }))
            })
            .clone();
        drop(map);

        let state = entry.lock().await;
        SessionSummary {
            session_id: session_id.to_string(),
            created_at: state.created_at,
            message_count: state.transcript.len(),
        }
    }

    /// Append to an existing session's transcript and return the new message
    /// count. The session must have been created via [`get_or_create`]
    /// beforehand.
    ///
    /// [`get_or_create`]: ConversationStore::get_or_create
    pub async fn append(&self, session_id: &str, message: Message) -> Result<usize, StoreError> {
        let entry = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        let mut state = entry.lock().await;
        state.transcript.push(message);
        Ok(state.transcript.len())
    }

    /// Full read view of one session.
    pub async fn get(&self, session_id: &str) -> Result<SessionSnapshot, StoreError> {
        let entry = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        let state = entry.lock().await;
        Ok(SessionSnapshot {
            session_id: session_id.to_string(),
            created_at: state.created_at,
            transcript: state.transcript.clone(),
        })
    }

    /// Summaries of all live sessions. Iteration order is unspecified.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let map = self.sessions.read().await;
        let mut out = Vec::with_capacity(map.len());
        for (id, entry) in map.iter() {
            let state = entry.lock().await;
            out.push(SessionSummary {
                session_id: id.clone(),
                created_at: state.created_at,
                message_count: state.transcript.len(),
            });
        }
        out
    }

    /// Remove a session and its transcript.
    pub async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    }

    /// Number of live sessions (health reporting).
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
