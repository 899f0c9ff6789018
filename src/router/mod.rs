//! Routing decision engine.
//!
//! [`Router::route`] asks the capability to classify a query against the two
//! available responders, then dispatches to the chosen one. Routing never
//! fails past this boundary: a broken or unreachable decision call degrades
//! to the web search responder with the original query untouched.

pub mod responders;

use serde::Serialize;
use tracing::{debug, warn};

use crate::llm::{ChatTurn, LlmProvider};
use crate::store::Message;
use responders::{KnowledgeBaseResponder, WebSearchResponder};

/// How many trailing history messages are forwarded with the decision
/// request. Older context is deliberately discarded to bound request size.
pub const HISTORY_WINDOW: usize = 5;

/// Reasoning recorded when the decision call fails and the router
/// substitutes web search.
pub const FALLBACK_REASONING: &str = "Fallback due to routing error";

const ROUTER_PERSONA: &str = r#"You are an intelligent routing assistant. Analyze the user's question and decide which tool to use:

1. **Knowledge Base** - for company-specific information, internal docs, FAQs, policies
2. **Web Search** - for current events, real-time info, general knowledge, recent news

Respond with JSON in this exact format:
{
    "tool": "web_search" or "knowledge_base",
    "reasoning": "Brief explanation of why this tool was chosen",
    "query": "Processed query for the chosen tool"
}"#;

// ── Decision types ───────────────────────────────────────────────────────────

/// The responder a query was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutedTool {
    WebSearch,
    KnowledgeBase,
}

impl RoutedTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutedTool::WebSearch => "web_search",
            RoutedTool::KnowledgeBase => "knowledge_base",
        }
    }
}

/// Outcome of one classification call. Produced per routing call; reflected
/// into the response and logs, never persisted.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub tool: RoutedTool,
    pub reasoning: String,
    /// The query actually handed to the responder — the model may rewrite
    /// or clean the original before dispatch.
    pub effective_query: String,
}

/// The router's output: the responder's answer plus how it was chosen.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub answer: String,
    pub decision: RouteDecision,
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Stateless dispatcher — holds only immutable capability handles, no
/// session data. Safe to share and call concurrently.
#[derive(Debug, Clone)]
pub struct Router {
    provider: LlmProvider,
    web_search: WebSearchResponder,
    knowledge_base: KnowledgeBaseResponder,
}

impl Router {
    pub fn new(provider: LlmProvider) -> Self {
        let web_search = WebSearchResponder::new(provider.clone());
        let knowledge_base = KnowledgeBaseResponder::new(provider.clone());
        Self { provider, web_search, knowledge_base }
    }

    /// Classify `query` against the available responders and dispatch.
    ///
    /// `query` is expected to be non-empty after trimming (caller
    /// precondition). `history` may be any length; only the trailing
    /// [`HISTORY_WINDOW`] messages reach the decision request.
    pub async fn route(&self, query: &str, history: &[Message]) -> RouteResult {
        let window = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
        let context: Vec<ChatTurn> = window
            .iter()
            .map(|m| ChatTurn::new(m.role.as_str(), m.content.clone()))
            .collect();

        let decision = match self
            .provider
            .generate_decision(ROUTER_PERSONA, &context, query)
            .await
        {
            Ok(payload) => {
                // Default branch: anything other than the recognised
                // "web_search" (unknown string, missing, null) routes to the
                // knowledge base.
                let tool = match payload.tool.as_deref() {
                    Some("web_search") => RoutedTool::WebSearch,
                    _ => RoutedTool::KnowledgeBase,
                };
                let effective_query = payload
                    .query
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or_else(|| query.to_string());
                let reasoning = payload.reasoning.unwrap_or_default();
                debug!(tool = tool.as_str(), %effective_query, "routing decision");
                RouteDecision { tool, reasoning, effective_query }
            }
            Err(e) => {
                warn!(error = %e, "routing decision failed — falling back to web search");
                RouteDecision {
                    tool: RoutedTool::WebSearch,
                    reasoning: FALLBACK_REASONING.to_string(),
                    effective_query: query.to_string(),
                }
            }
        };

        let answer = match decision.tool {
            RoutedTool::WebSearch => self.web_search.answer(&decision.effective_query).await,
            RoutedTool::KnowledgeBase => {
                self.knowledge_base.answer(&decision.effective_query).await
            }
        };

        RouteResult { answer, decision }
    }
}
