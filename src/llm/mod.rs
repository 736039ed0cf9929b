//! LLM integration for the intake service.
//!
//! Supports any OpenAI-compatible chat-completions endpoint. The orchestrator
//! only sees the `LlmProvider` trait, so tests swap in scripted providers.

pub mod openai;
pub mod provider;

pub use openai::OpenAiCompatProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::config::env_or;
use crate::error::{ConfigError, LlmError};

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Bound on a single model call, including connect and body read.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Load from `INTAKE_LLM_*` variables. The key falls back to `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("INTAKE_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| ConfigError::MissingEnvVar("INTAKE_LLM_API_KEY".to_string()))?;

        let api_url =
            std::env::var("INTAKE_LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = std::env::var("INTAKE_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs: u64 = env_or("INTAKE_LLM_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_url,
            api_key: secrecy::SecretString::from(api_key),
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiCompatProvider::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.timeout,
    )?;
    tracing::info!(model = %config.model, url = %config.api_url, "Using chat-completions provider");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_reports_model() {
        let config = LlmConfig {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: secrecy::SecretString::from("sk-test"),
            model: "gpt-4o".to_string(),
            timeout: Duration::from_secs(10),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o");
    }
}
