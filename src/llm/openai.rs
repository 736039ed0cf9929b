//! OpenAI-compatible chat-completions client.
//!
//! Posts `{model, messages, max_tokens, temperature}` with a bearer key and
//! returns `choices[0].message.content`. Works against any endpoint that
//! speaks the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::LlmError;

use super::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

const PROVIDER: &str = "openai";

/// Chat-completions provider backed by `reqwest`.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
            model: model.into(),
            timeout,
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.to_string(),
                timeout: self.timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.request_body(&request);

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmError::RateLimited {
                provider: PROVIDER.to_string(),
                retry_after,
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let data: Value = resp.json().await.map_err(|e| self.map_send_error(e))?;
        let response = parse_chat_completion(&data)?;

        tracing::debug!(
            model = %self.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM completion finished"
        );

        Ok(response)
    }
}

/// Pull the first choice's content out of a chat-completions body.
fn parse_chat_completion(data: &Value) -> Result<CompletionResponse, LlmError> {
    let choice = data
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "choices are missing or empty".to_string(),
        })?;

    let content = choice
        .pointer("/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let usage = data.get("usage");
    let token_count = |key: &str| {
        usage
            .and_then(|u| u.get(key))
            .and_then(Value::as_u64)
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
    };

    Ok(CompletionResponse {
        content,
        input_tokens: token_count("prompt_tokens"),
        output_tokens: token_count("completion_tokens"),
        finish_reason: FinishReason::from_api(
            choice.get("finish_reason").and_then(Value::as_str),
        ),
        response_id: data.get("id").and_then(Value::as_str).map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "http://127.0.0.1:9/v1/chat/completions",
            SecretString::from("sk-test"),
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn parses_first_choice() {
        let data = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                {"message": {"role": "assistant", "content": "{\"answer\": \"hi\"}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        });
        let resp = parse_chat_completion(&data).unwrap();
        assert_eq!(resp.content, r#"{"answer": "hi"}"#);
        assert_eq!(resp.input_tokens, 12);
        assert_eq!(resp.output_tokens, 5);
        assert_eq!(resp.finish_reason, FinishReason::Stop);
        assert_eq!(resp.response_id.as_deref(), Some("chatcmpl-1"));
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let data = serde_json::json!({"choices": []});
        assert!(matches!(
            parse_chat_completion(&data),
            Err(LlmError::InvalidResponse { .. })
        ));
        assert!(parse_chat_completion(&serde_json::json!({})).is_err());
    }

    #[test]
    fn oversized_token_counts_saturate() {
        let data = serde_json::json!({
            "choices": [{"message": {"content": "ok"}}],
            "usage": {"prompt_tokens": 5_000_000_000u64, "completion_tokens": 7}
        });
        let resp = parse_chat_completion(&data).unwrap();
        assert_eq!(resp.input_tokens, u32::MAX);
        assert_eq!(resp.output_tokens, 7);
    }

    #[test]
    fn request_body_carries_model_and_knobs() {
        let p = provider();
        let req = CompletionRequest::new(vec![ChatMessage::system("role"), ChatMessage::user("ctx")])
            .with_max_tokens(300);
        let body = p.request_body(&req);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "ctx");
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let p = provider();
        let result = p
            .complete(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await;
        assert!(matches!(
            result,
            Err(LlmError::RequestFailed { .. }) | Err(LlmError::Timeout { .. })
        ));
    }
}
