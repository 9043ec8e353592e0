//! Shared HTTP client for HTTP-based completion providers.
//!
//! One `reqwest::Client` is configured per backend and reused for every call.
//! This layer makes a single attempt and classifies failures; backoff lives in
//! [`CompletionClient`](crate::CompletionClient).

use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use docforge_utils::error::LlmError;
use docforge_utils::redaction::redact_error_message;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of an error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Execute one request with timeout `min(request_timeout, max_timeout)`.
    ///
    /// Non-success responses are turned into classified errors:
    /// - 401/403 → `AuthenticationFailed`
    /// - 429 → `RateLimited`
    /// - anything else → classified from the response body text
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    duration: effective_timeout,
                });
            }
            Err(e) => {
                return Err(LlmError::classify_message(&format!(
                    "{provider_name} request failed: {e}"
                )));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_error_status(status, &body, provider_name))
    }
}

/// Map a non-success status and its body to an `LlmError`.
pub(crate) fn map_error_status(status: StatusCode, body: &str, provider_name: &str) -> LlmError {
    let detail: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    let message = format!("{provider_name} returned {status}: {detail}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::AuthenticationFailed(redact_error_message(&message))
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(redact_error_message(&message)),
        _ => LlmError::classify_message(&message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_effective_timeout_is_capped() {
        let client = HttpClient::with_max_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.max_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_401_maps_to_authentication() {
        let err = map_error_status(StatusCode::UNAUTHORIZED, "{}", "openai");
        assert!(matches!(err, LlmError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_403_maps_to_authentication() {
        let err = map_error_status(StatusCode::FORBIDDEN, "", "openai");
        assert!(matches!(err, LlmError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_429_maps_to_rate_limited() {
        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, "slow down", "openai");
        assert!(matches!(err, LlmError::RateLimited(_)));
    }

    #[test]
    fn test_body_text_classifies_other_statuses() {
        let err = map_error_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "{\"error\":{\"message\":\"Rate limit reached for requests\"}}",
            "openai",
        );
        assert!(matches!(err, LlmError::RateLimited(_)));

        let err = map_error_status(StatusCode::BAD_REQUEST, "Invalid API key", "openai");
        assert!(matches!(err, LlmError::AuthenticationFailed(_)));

        let err = map_error_status(StatusCode::INTERNAL_SERVER_ERROR, "boom", "openai");
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[test]
    fn test_error_body_is_redacted_and_truncated() {
        let key = "sk-0123456789abcdefghijklmnopqrstuvwxyz";
        let body = format!("bad key {key} {}", "x".repeat(2000));
        let err = map_error_status(StatusCode::UNAUTHORIZED, &body, "openai");
        let text = err.to_string();
        assert!(!text.contains(key));
        assert!(text.len() < 700);
    }
}
