//! Configuration types.

use std::str::FromStr;

use crate::error::ConfigError;

/// Conversation/turn-processing configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Max tokens for each model call.
    pub max_tokens: u32,
    /// Sampling temperature for the answer call.
    pub answer_temperature: f32,
    /// Sampling temperature for the destination/needs extraction call.
    pub extraction_temperature: f32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            answer_temperature: 0.3,
            extraction_temperature: 0.0,
        }
    }
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_tokens: env_or("INTAKE_LLM_MAX_TOKENS", defaults.max_tokens)?,
            answer_temperature: env_or("INTAKE_ANSWER_TEMPERATURE", defaults.answer_temperature)?,
            extraction_temperature: env_or(
                "INTAKE_EXTRACTION_TEMPERATURE",
                defaults.extraction_temperature,
            )?,
        })
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: env_or("INTAKE_HTTP_PORT", Self::default().port)?,
        })
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
///
/// A set but unparsable value is an error rather than a silent default.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}
