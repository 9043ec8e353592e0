//! Completion client retry and backoff behavior.
//!
//! Sleeps are recorded instead of performed, so exact delays are asserted
//! without waiting.

use std::sync::Arc;
use std::time::Duration;

use docforge::{
    CompletionClient, GenerationContext, GenerationParams, LlmError, ProjectInfo, RetryPolicy,
};
use docforge_llm::test_support::{RecordingSleeper, ScriptedBackend};

fn rate_limited() -> Result<String, LlmError> {
    Err(LlmError::RateLimited("429 Too Many Requests".to_string()))
}

fn client(backend: Arc<ScriptedBackend>, sleeper: Arc<RecordingSleeper>) -> CompletionClient {
    CompletionClient::new(backend)
        .with_policy(RetryPolicy::new(3, Duration::from_secs(2)))
        .with_sleeper(sleeper)
}

fn context() -> GenerationContext {
    GenerationContext::new(ProjectInfo::new("retry-demo", "exercise the retry loop"))
}

fn expected_delays(retries: u32) -> Vec<Duration> {
    (0..retries)
        .map(|attempt| Duration::from_secs(2) * 2u32.pow(attempt))
        .collect()
}

#[tokio::test]
async fn recovers_after_fewer_rate_limits_than_the_retry_budget() {
    for k in 0..3u32 {
        let mut script: Vec<_> = (0..k).map(|_| rate_limited()).collect();
        script.push(Ok("document".to_string()));
        let backend = Arc::new(ScriptedBackend::new(script));
        let sleeper = Arc::new(RecordingSleeper::default());

        let text = client(backend.clone(), sleeper.clone())
            .generate("# Prompt", &context(), &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(text, "document");
        assert_eq!(backend.invocations().len(), k as usize + 1);
        assert_eq!(sleeper.async_sleeps(), expected_delays(k));
    }
}

#[tokio::test]
async fn gives_up_after_max_retries_plus_one_attempts() {
    let backend = Arc::new(ScriptedBackend::repeating(rate_limited()));
    let sleeper = Arc::new(RecordingSleeper::default());

    let err = client(backend.clone(), sleeper.clone())
        .generate("# Prompt", &context(), &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::RateLimited(_)));
    assert_eq!(backend.invocations().len(), 4);
    assert_eq!(sleeper.sleeps(), expected_delays(3));
}

#[tokio::test]
async fn authentication_and_transport_errors_are_not_retried() {
    for failure in [
        LlmError::AuthenticationFailed("invalid api key".to_string()),
        LlmError::Transport("connection refused".to_string()),
        LlmError::Timeout {
            duration: Duration::from_secs(60),
        },
    ] {
        let backend = Arc::new(ScriptedBackend::repeating(Err(failure.clone())));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = client(backend.clone(), sleeper.clone())
            .generate("# Prompt", &context(), &GenerationParams::default())
            .await
            .unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(backend.invocations().len(), 1);
        assert!(sleeper.sleeps().is_empty());
    }
}

#[test]
fn blocking_variant_uses_the_same_schedule() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        rate_limited(),
        rate_limited(),
        Ok("document".to_string()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());

    let text = client(backend.clone(), sleeper.clone())
        .generate_blocking("# Prompt", &context(), &GenerationParams::default())
        .unwrap();

    assert_eq!(text, "document");
    assert_eq!(backend.invocations().len(), 3);
    assert_eq!(sleeper.blocking_sleeps(), expected_delays(2));
    assert!(sleeper.async_sleeps().is_empty());
}
