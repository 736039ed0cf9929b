//! Error types for the commute intake service.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Errors raised while processing a conversation turn.
///
/// Any of these aborts the turn: no partial response is produced.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// The model text could not be parsed as the expected JSON.
    #[error("Invalid model output: {0}")]
    InvalidModelOutput(String),

    /// The model JSON parsed but a required key was absent.
    #[error("Missing field in model output: {0}")]
    MissingField(String),

    /// The caller's payload was absent or had the wrong shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The LLM provider could not be reached or failed. Safe to retry.
    #[error("Upstream model unavailable: {0}")]
    UpstreamUnavailable(#[from] LlmError),
}

impl IntakeError {
    /// Whether the caller may retry the same turn unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }

    /// Stable tag used in HTTP error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidModelOutput(_) => "invalid_model_output",
            Self::MissingField(_) => "missing_field",
            Self::MalformedInput(_) => "malformed_input",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}
