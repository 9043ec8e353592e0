//! OpenAI-compatible chat-completions backend.
//!
//! Works against any service that exposes `POST {base_url}/chat/completions`
//! with the OpenAI request and response shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use docforge_config::Config;
use docforge_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const PROVIDER: &str = "openai";

#[derive(Clone)]
pub struct OpenAiBackend {
    client: Arc<HttpClient>,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a backend for `base_url` (for example `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the key is empty or the HTTP
    /// client cannot be constructed
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Misconfiguration(
                "API key for the completion service is empty".to_string(),
            ));
        }

        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            endpoint: chat_completions_endpoint(base_url),
            api_key,
        })
    }

    /// Create a backend from configuration, reading the key from the
    /// environment variable named by `llm.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - The HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let api_key_env = config.api_key_env();
        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm]."
            ))
        })?;

        Self::new(api_key, config.base_url())
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

fn chat_completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        debug!(
            provider = PROVIDER,
            model = %inv.model,
            max_tokens = inv.max_tokens,
            temperature = inv.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking completion backend"
        );

        let request_body = ChatCompletionRequest {
            model: inv.model.clone(),
            messages: Self::convert_messages(&inv.messages),
            temperature: inv.temperature,
            max_tokens: inv.max_tokens,
        };

        let request = self
            .client
            .inner()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse completion response: {e}")))?;

        let choice = response_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transport("completion response missing choices[0]".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            LlmError::Transport("completion response missing content in choices[0]".to_string())
        })?;

        let model_used = response_body.model.unwrap_or(inv.model);
        let mut result = LlmResult::new(content, PROVIDER, model_used);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Completion backend returned"
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            chat_completions_endpoint("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_endpoint("http://localhost:8080/v1/"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_convert_messages_preserves_roles_and_order() {
        let messages = vec![Message::system("be terse"), Message::user("write")];

        let converted = OpenAiBackend::convert_messages(&messages);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[0].content, "be terse");
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: OpenAiBackend::convert_messages(&[Message::user("hi")]),
            temperature: 0.5,
            max_tokens: 100,
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_response_parsing_with_usage() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4-0613",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.model.as_deref(), Some("gpt-4-0613"));
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Hello"));
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 12);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = OpenAiBackend::new("  ", "https://api.openai.com/v1").unwrap_err();
        assert!(matches!(err, LlmError::Misconfiguration(_)));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let backend = OpenAiBackend::new("sk-secret-value", "https://api.openai.com/v1").unwrap();
        let shown = format!("{backend:?}");
        assert!(!shown.contains("sk-secret-value"));
    }

    #[test]
    #[serial]
    fn test_new_from_config_missing_key() {
        let config = Config::builder()
            .api_key_env("DOCFORGE_TEST_MISSING_KEY")
            .build()
            .unwrap();
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::remove_var("DOCFORGE_TEST_MISSING_KEY") };

        let err = OpenAiBackend::new_from_config(&config).unwrap_err();

        match err {
            LlmError::Misconfiguration(msg) => assert!(msg.contains("DOCFORGE_TEST_MISSING_KEY")),
            other => panic!("expected Misconfiguration, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_new_from_config_reads_key_and_base_url() {
        let config = Config::builder()
            .api_key_env("DOCFORGE_TEST_PRESENT_KEY")
            .base_url("http://localhost:9999/v1/")
            .build()
            .unwrap();
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var("DOCFORGE_TEST_PRESENT_KEY", "sk-test") };

        let backend = OpenAiBackend::new_from_config(&config).unwrap();

        assert_eq!(backend.endpoint(), "http://localhost:9999/v1/chat/completions");
        assert_eq!(backend.name(), "openai");
        unsafe { std::env::remove_var("DOCFORGE_TEST_PRESENT_KEY") };
    }
}
