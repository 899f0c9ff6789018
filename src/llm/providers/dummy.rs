//! Dummy LLM provider — echoes input back prefixed with `[echo]`.
//! Used for exercising the full request path without a real API key.

use crate::llm::{ChatTurn, DecisionPayload, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn generate(
        &self,
        _persona: &str,
        _context: &[ChatTurn],
        user_text: &str,
        _temperature: f32,
    ) -> Result<String, ProviderError> {
        Ok(format!("[echo] {user_text}"))
    }

    /// Always selects web search — keyless runs have no knowledge base to
    /// speak of, and this keeps the echo output flowing through one path.
    pub async fn generate_decision(
        &self,
        _persona: &str,
        _context: &[ChatTurn],
        user_text: &str,
    ) -> Result<DecisionPayload, ProviderError> {
        Ok(DecisionPayload {
            tool: Some("web_search".to_string()),
            reasoning: Some("dummy provider always routes to web search".to_string()),
            query: Some(user_text.to_string()),
        })
    }
}
