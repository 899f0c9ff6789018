//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file and applies `SWITCHBOARD_HTTP_BIND` and
//! `SWITCHBOARD_LOG_LEVEL` env overrides. The LLM API key is read from
//! `LLM_API_KEY` only — it never appears in the TOML.

use std::env;
use std::fs;
use std::path::Path;

use crate::core::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and `config/default.toml` does not
/// exist, returns a hardcoded minimal default.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let bind_override = env::var("SWITCHBOARD_HTTP_BIND").ok();
    let log_level_override = env::var("SWITCHBOARD_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            bind_override.as_deref(),
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(
            default_path,
            bind_override.as_deref(),
            log_level_override.as_deref(),
        )
    } else {
        Ok(Config {
            service_name: raw::default_service_name(),
            log_level: log_level_override.unwrap_or_else(raw::default_log_level),
            http: HttpConfig {
                bind: bind_override.unwrap_or_else(raw::default_http_bind),
            },
            llm: LlmConfig {
                provider: raw::default_llm_provider(),
                openai: OpenAiConfig {
                    api_base_url: raw::default_openai_api_base_url(),
                    model: raw::default_openai_model(),
                    timeout_seconds: raw::default_openai_timeout_seconds(),
                },
            },
            llm_api_key: env::var("LLM_API_KEY").ok(),
        })
    }
}

/// Load and resolve config from an explicit file path.
///
/// `bind_override` and `log_level_override` take precedence over the file
/// values when present (they carry the env-var overrides from [`load`]).
pub fn load_from(
    path: &Path,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let log_level = log_level_override
        .map(ToString::to_string)
        .unwrap_or(parsed.service.log_level);
    let bind = bind_override
        .map(ToString::to_string)
        .unwrap_or(parsed.http.bind);

    Ok(Config {
        service_name: parsed.service.name,
        log_level,
        http: HttpConfig { bind },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
}
