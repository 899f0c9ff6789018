//! LLM capability abstraction.
//!
//! The external language model is consumed through exactly two operations:
//! [`LlmProvider::generate`] for free-text answers and
//! [`LlmProvider::generate_decision`] for machine-parseable routing
//! decisions. Everything above this module (router, responders) is
//! provider-agnostic.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Async is delegated to the underlying provider; the methods are `async fn`
//! on the enum so callers need no trait-object machinery.

pub mod providers;

use serde::Deserialize;
use thiserror::Error;

use providers::dummy::DummyProvider;
use providers::openai_compatible::OpenAiCompatibleProvider;
use providers::scripted::ScriptedProvider;

/// Sampling temperature for routing-decision calls. Low to favour
/// deterministic classification over creative rewording.
pub(crate) const DECISION_TEMPERATURE: f32 = 0.3;

// ── Error ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("malformed decision payload: {0}")]
    Decision(String),
}

// ── Conversation context ─────────────────────────────────────────────────────

/// One prior conversation turn forwarded to the capability as context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Wire role: `"user"` or `"assistant"`.
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

// ── Decision payload ─────────────────────────────────────────────────────────

/// The structured routing decision as the model returned it.
///
/// All fields are optional on purpose: a missing or unrecognised `tool`
/// flows into the router's default-branch tie-break, never into a field
/// access panic. Only non-JSON output is an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionPayload {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Validate raw model output into a [`DecisionPayload`].
///
/// Shared by every provider backend so they fail identically on garbage.
pub(crate) fn parse_decision(text: &str) -> Result<DecisionPayload, ProviderError> {
    serde_json::from_str::<DecisionPayload>(text)
        .map_err(|e| ProviderError::Decision(e.to_string()))
}

// ── Provider enum ────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new arm in both methods.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(DummyProvider),
    OpenAiCompatible(OpenAiCompatibleProvider),
    Scripted(ScriptedProvider),
}

impl LlmProvider {
    /// Free-text generation under a fixed behavioural persona.
    ///
    /// `context` carries prior conversation turns (may be empty);
    /// `user_text` is the current request; `temperature` is the caller's
    /// creativity setting.
    pub async fn generate(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.generate(persona, context, user_text, temperature).await,
            LlmProvider::OpenAiCompatible(p) => {
                p.generate(persona, context, user_text, temperature).await
            }
            LlmProvider::Scripted(p) => p.generate(persona, context, user_text, temperature).await,
        }
    }

    /// Structured-output variant: the model must answer with a JSON routing
    /// decision, validated into [`DecisionPayload`] before it is returned.
    pub async fn generate_decision(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
    ) -> Result<DecisionPayload, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.generate_decision(persona, context, user_text).await,
            LlmProvider::OpenAiCompatible(p) => {
                p.generate_decision(persona, context, user_text).await
            }
            LlmProvider::Scripted(p) => p.generate_decision(persona, context, user_text).await,
        }
    }
}
