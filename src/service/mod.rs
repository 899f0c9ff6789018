//! Question-handling service — ties the router to the conversation store.
//!
//! This is the boundary the HTTP channel consumes: validate input, resolve
//! the session, route the question, and record both sides of the exchange in
//! the transcript. Capability failures never surface here — they are already
//! content (responder error strings) or absorbed (router fallback) by the
//! time control returns.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::llm::LlmProvider;
use crate::router::{RoutedTool, Router};
use crate::store::{ConversationStore, Message, SessionSnapshot, SessionSummary, StoreError};

/// Shown when the chosen responder produced an empty answer.
const EMPTY_ANSWER_FALLBACK: &str =
    "I apologize, but I couldn't generate a response. Please try rephrasing your question.";

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No question provided")]
    EmptyQuestion,
    #[error("Session not found")]
    SessionNotFound(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ServiceError::SessionNotFound(id),
        }
    }
}

// ── Reply types ──────────────────────────────────────────────────────────────

/// Everything the caller gets back for one answered question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionReply {
    pub session_id: String,
    pub question: String,
    #[serde(rename = "response")]
    pub answer: String,
    pub tool_used: RoutedTool,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub active_sessions: usize,
}

// ── Service ──────────────────────────────────────────────────────────────────

/// Owns the conversation store; shared as `Arc` by the HTTP channel.
pub struct ChatService {
    router: Router,
    store: ConversationStore,
}

impl ChatService {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            router: Router::new(provider),
            store: ConversationStore::new(),
        }
    }

    /// Answer one question within a session.
    ///
    /// An absent or blank `session_id` gets a freshly generated UUID before
    /// any store interaction. The user message is recorded first, the
    /// routing decision sees the transcript including it, and the assistant
    /// reply is appended once the responder returns.
    pub async fn handle_question(
        &self,
        session_id: Option<String>,
        question: &str,
    ) -> Result<QuestionReply, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::EmptyQuestion);
        }

        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(%session_id, "processing question");

        self.store.get_or_create(&session_id).await;
        self.store
            .append(&session_id, Message::user(question))
            .await?;

        let history = self.store.get(&session_id).await?.transcript;

        debug!(%session_id, "running router");
        let result = self.router.route(question, &history).await;

        let answer = if result.answer.trim().is_empty() {
            EMPTY_ANSWER_FALLBACK.to_string()
        } else {
            result.answer
        };

        let count = self
            .store
            .append(&session_id, Message::assistant(answer.clone()))
            .await?;
        info!(%session_id, message_count = count, tool = result.decision.tool.as_str(), "question answered");

        Ok(QuestionReply {
            session_id,
            question: question.to_string(),
            answer,
            tool_used: result.decision.tool,
            reasoning: result.decision.reasoning,
            timestamp: Utc::now(),
        })
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        self.store.list().await
    }

    pub async fn session_detail(&self, session_id: &str) -> Result<SessionSnapshot, ServiceError> {
        Ok(self.store.get(session_id).await?)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ServiceError> {
        self.store.delete(session_id).await?;
        info!(%session_id, "session deleted");
        Ok(())
    }

    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            timestamp: Utc::now(),
            active_sessions: self.store.active_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::scripted::ScriptedProvider;
    use crate::store::Role;

    fn scripted_service() -> (ScriptedProvider, ChatService) {
        let inner = ScriptedProvider::new();
        let service = ChatService::new(LlmProvider::Scripted(inner.clone()));
        (inner, service)
    }

    #[tokio::test]
    async fn end_to_end_knowledge_base_question() {
        let (inner, service) = scripted_service();
        inner.push_decision(
            r#"{"tool": "knowledge_base", "reasoning": "company policy", "query": "refund policy"}"#,
        );
        inner.push_answer("Refunds are accepted within 30 days.");

        let reply = service
            .handle_question(None, "What is our refund policy?")
            .await
            .unwrap();

        assert_eq!(reply.tool_used, RoutedTool::KnowledgeBase);
        assert_eq!(reply.answer, "Refunds are accepted within 30 days.");
        assert_eq!(reply.reasoning, "company policy");
        // freshly generated id is a real UUID
        assert!(Uuid::parse_str(&reply.session_id).is_ok());

        // transcript holds exactly [user, assistant] in order
        let snap = service.session_detail(&reply.session_id).await.unwrap();
        assert_eq!(snap.transcript.len(), 2);
        assert_eq!(snap.transcript[0].role, Role::User);
        assert_eq!(snap.transcript[0].content, "What is our refund policy?");
        assert_eq!(snap.transcript[1].role, Role::Assistant);
        assert_eq!(snap.transcript[1].content, "Refunds are accepted within 30 days.");
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_any_state() {
        let (_inner, service) = scripted_service();

        let err = service.handle_question(None, "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyQuestion));
        assert!(service.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn blank_session_id_gets_a_fresh_uuid() {
        let (inner, service) = scripted_service();
        inner.push_decision(r#"{"tool": "web_search"}"#);
        inner.push_answer("ok");

        let reply = service
            .handle_question(Some("  ".into()), "hello")
            .await
            .unwrap();
        assert!(Uuid::parse_str(&reply.session_id).is_ok());
    }

    #[tokio::test]
    async fn reused_session_accumulates_history() {
        let (inner, service) = scripted_service();
        for _ in 0..2 {
            inner.push_decision(r#"{"tool": "web_search"}"#);
        }
        inner.push_answer("first");
        inner.push_answer("second");

        let first = service.handle_question(None, "one").await.unwrap();
        let second = service
            .handle_question(Some(first.session_id.clone()), "two")
            .await
            .unwrap();

        assert_eq!(first.session_id, second.session_id);
        let snap = service.session_detail(&first.session_id).await.unwrap();
        assert_eq!(snap.transcript.len(), 4);

        // the second decision call saw the earlier exchange plus the new
        // user message
        let calls = inner.recorded_decision_calls();
        assert_eq!(calls[1].context_len, 3);
    }

    #[tokio::test]
    async fn routing_failure_still_answers_via_web_search() {
        let (inner, service) = scripted_service();
        inner.push_decision_error("capability down");
        inner.push_answer("fallback answer");

        let reply = service.handle_question(None, "anything").await.unwrap();
        assert_eq!(reply.tool_used, RoutedTool::WebSearch);
        assert_eq!(reply.reasoning, crate::router::FALLBACK_REASONING);
        assert_eq!(reply.answer, "fallback answer");
    }

    #[tokio::test]
    async fn empty_answer_becomes_apology() {
        let (inner, service) = scripted_service();
        inner.push_decision(r#"{"tool": "web_search"}"#);
        inner.push_answer("   ");

        let reply = service.handle_question(None, "hm").await.unwrap();
        assert_eq!(reply.answer, EMPTY_ANSWER_FALLBACK);

        // the apology is what lands in the transcript
        let snap = service.session_detail(&reply.session_id).await.unwrap();
        assert_eq!(snap.transcript[1].content, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn unknown_session_detail_is_not_found() {
        let (_inner, service) = scripted_service();
        let err = service.session_detail("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn delete_session_round_trip() {
        let (inner, service) = scripted_service();
        inner.push_decision(r#"{"tool": "web_search"}"#);
        inner.push_answer("ok");

        let reply = service.handle_question(None, "hi").await.unwrap();
        service.delete_session(&reply.session_id).await.unwrap();

        let err = service.session_detail(&reply.session_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotFound(_)));
        let err = service.delete_session(&reply.session_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn health_reports_active_sessions() {
        let (inner, service) = scripted_service();
        inner.push_decision(r#"{"tool": "web_search"}"#);
        inner.push_answer("ok");

        let before = service.health().await;
        assert_eq!(before.status, "healthy");
        assert_eq!(before.active_sessions, 0);

        service.handle_question(None, "hi").await.unwrap();
        let after = service.health().await;
        assert_eq!(after.active_sessions, 1);
    }
}
