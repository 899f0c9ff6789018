//! Scripted LLM provider — replays canned responses and records every call.
//!
//! Test double for the capability boundary: queue decisions/answers up front,
//! then assert on what the code under test actually sent (persona, context
//! window size, user text). Queues drain front-to-back; an exhausted answer
//! queue falls back to an echo so multi-turn tests don't have to script
//! every reply, while an exhausted decision queue errors — decision-failure
//! behaviour is something tests opt into explicitly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::llm::{ChatTurn, DecisionPayload, ProviderError, parse_decision};

/// One observed capability call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub persona: String,
    pub context_len: usize,
    pub user_text: String,
    /// `None` for decision calls (their temperature is fixed internally).
    pub temperature: Option<f32>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    decisions: Mutex<VecDeque<Result<String, String>>>,
    answers: Mutex<VecDeque<Result<String, String>>>,
    decision_calls: Mutex<Vec<RecordedCall>>,
    answer_calls: Mutex<Vec<RecordedCall>>,
}

/// Cheaply cloneable — clones share the same queues and call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    inner: Arc<ScriptedInner>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw decision body. It goes through the same JSON validation
    /// as real model output, so malformed text exercises the parse-failure
    /// path exactly like production garbage would.
    pub fn push_decision(&self, raw_json: &str) {
        self.inner
            .decisions
            .lock()
            .unwrap()
            .push_back(Ok(raw_json.to_string()));
    }

    /// Queue a transport-level decision failure.
    pub fn push_decision_error(&self, message: &str) {
        self.inner
            .decisions
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn push_answer(&self, text: &str) {
        self.inner
            .answers
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
    }

    pub fn push_answer_error(&self, message: &str) {
        self.inner
            .answers
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn recorded_decision_calls(&self) -> Vec<RecordedCall> {
        self.inner.decision_calls.lock().unwrap().clone()
    }

    pub fn recorded_answer_calls(&self) -> Vec<RecordedCall> {
        self.inner.answer_calls.lock().unwrap().clone()
    }

    pub async fn generate(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        self.inner.answer_calls.lock().unwrap().push(RecordedCall {
            persona: persona.to_string(),
            context_len: context.len(),
            user_text: user_text.to_string(),
            temperature: Some(temperature),
        });

        match self.inner.answers.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(ProviderError::Request(msg)),
            None => Ok(format!("[scripted] {user_text}")),
        }
    }

    pub async fn generate_decision(
        &self,
        persona: &str,
        context: &[ChatTurn],
        user_text: &str,
    ) -> Result<DecisionPayload, ProviderError> {
        self.inner.decision_calls.lock().unwrap().push(RecordedCall {
            persona: persona.to_string(),
            context_len: context.len(),
            user_text: user_text.to_string(),
            temperature: None,
        });

        match self.inner.decisions.lock().unwrap().pop_front() {
            Some(Ok(raw)) => parse_decision(&raw),
            Some(Err(msg)) => Err(ProviderError::Request(msg)),
            None => Err(ProviderError::Request("no scripted decision queued".into())),
        }
    }
}
