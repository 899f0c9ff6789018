//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `SWITCHBOARD_HTTP_BIND` and `SWITCHBOARD_LOG_LEVEL` env
//! overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs consumed by the rest of the
//!   crate (`Config`, `LlmConfig`, `HttpConfig`).
//! - **raw** — Raw TOML deserialization types (`RawConfig`, `RawLlm`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load** — Loading logic: `load`, `load_from`.

mod load;
mod raw;
mod types;

pub use load::{load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests — dummy LLM, no API keys, no external calls.
    pub fn test_default() -> Self {
        Self {
            service_name: "test".into(),
            log_level: "info".into(),
            http: HttpConfig {
                bind: "127.0.0.1:0".into(),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}
