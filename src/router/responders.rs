//! Responder variants — one fixed persona each, never fail past their
//! boundary.
//!
//! A capability failure is converted into a human-readable answer string
//! (the caller always has something to show the user); the error itself is
//! logged here with full context.

use tracing::error;

use crate::llm::{ChatTurn, LlmProvider};

const WEB_SEARCH_PERSONA: &str = "You are a web search assistant. Answer with \
current, real-world information the way a live web search would: general \
knowledge, recent events, and up-to-date facts. Be concise and note when \
something may have changed recently.";

const KNOWLEDGE_BASE_PERSONA: &str = "You are a knowledge base specialist. \
Answer based on internal company documentation, FAQs, policies, and \
procedures. If you don't have specific information, clearly state that.";

const WEB_SEARCH_TEMPERATURE: f32 = 0.7;
const KNOWLEDGE_BASE_TEMPERATURE: f32 = 0.3;

/// Empty context shared by both responders — conversation history is the
/// router's concern; responders answer the (possibly rewritten) query alone.
const NO_CONTEXT: &[ChatTurn] = &[];

// ── Web search ───────────────────────────────────────────────────────────────

/// Answers from general/current knowledge under a search-oriented persona.
#[derive(Debug, Clone)]
pub struct WebSearchResponder {
    provider: LlmProvider,
}

impl WebSearchResponder {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    pub async fn answer(&self, query: &str) -> String {
        match self
            .provider
            .generate(WEB_SEARCH_PERSONA, NO_CONTEXT, query, WEB_SEARCH_TEMPERATURE)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "web search responder failed");
                format!("Web search error: {e}")
            }
        }
    }
}

// ── Knowledge base ───────────────────────────────────────────────────────────

/// Answers from company-internal knowledge only, at low temperature for
/// precision over creativity.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseResponder {
    provider: LlmProvider,
}

impl KnowledgeBaseResponder {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    pub async fn answer(&self, query: &str) -> String {
        let prompt = format!("Search knowledge base for: {query}");
        match self
            .provider
            .generate(
                KNOWLEDGE_BASE_PERSONA,
                NO_CONTEXT,
                &prompt,
                KNOWLEDGE_BASE_TEMPERATURE,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "knowledge base responder failed");
                format!("Knowledge base search error: {e}")
            }
        }
    }
}
