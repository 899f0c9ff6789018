//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Exposes the two capability operations (`generate`, `generate_decision`)
//! matching the rest of the `LlmProvider` abstraction. All OpenAI wire types
//! are private to this module — callers never see them.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{ChatTurn, DECISION_TEMPERATURE, DecisionPayload, ProviderError, parse_decision};

// ── Public provider ──────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, api_key })
    }

    /// Free-text completion: `persona` as the system prompt, `context` as
    /// prior turns, `user_text` as the final user message.
    pub async fn generate(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        self.complete(persona, context, user_text, temperature, None).await
    }

    /// Structured routing decision: same request shape, but the endpoint is
    /// told to emit a JSON object, which is validated before it is returned.
    pub async fn generate_decision(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
    ) -> Result<DecisionPayload, ProviderError> {
        let text = self
            .complete(
                persona,
                context,
                user_text,
                DECISION_TEMPERATURE,
                Some(ResponseFormat::json_object()),
            )
            .await?;
        parse_decision(&text)
    }

    /// One chat-completions round-trip. History management is intentionally
    /// the caller's responsibility.
    async fn complete(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
        temperature: f32,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, ProviderError> {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(temperature)
        };

        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(WireMessage { role: "system".to_string(), content: persona.to_string() });
        for turn in context {
            messages.push(WireMessage { role: turn.role.clone(), content: turn.content.clone() });
        }
        messages.push(WireMessage { role: "user".to_string(), content: user_text.to_string() });

        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            response_format,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            context_len = context.len(),
            structured = payload.response_format.is_some(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        if let Some(u) = &parsed.usage {
            debug!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                "llm usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))
    }
}

// ── Private wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

impl ResponseFormat {
    fn json_object() -> Self {
        Self { kind: "json_object".to_string() }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_provider() {
        let provider = OpenAiCompatibleProvider::new(
            "http://127.0.0.1:8081/v1/chat/completions".to_string(),
            "gpt-4o".to_string(),
            5,
            None,
        );
        assert!(provider.is_ok());
    }

    #[test]
    fn request_serialization_skips_absent_fields() {
        let payload = ChatCompletionRequest {
            model: "m".into(),
            messages: vec![WireMessage { role: "user".into(), content: "hi".into() }],
            temperature: None,
            response_format: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("response_format"));
    }

    #[test]
    fn request_serialization_structured_output() {
        let payload = ChatCompletionRequest {
            model: "m".into(),
            messages: vec![],
            temperature: Some(0.3),
            response_format: Some(ResponseFormat::json_object()),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""response_format":{"type":"json_object"}"#));
        assert!(json.contains(r#""temperature":0.3"#));
    }
}
