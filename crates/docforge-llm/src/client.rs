//! Completion client: message assembly, rate-limit backoff and tracing.
//!
//! [`CompletionClient::generate`] turns a stage prompt plus its
//! [`GenerationContext`] into a system/user message pair, sends it through a
//! [`LlmBackend`], and retries only when the backend reports
//! [`LlmError::RateLimited`]. Every other failure is returned on the first
//! attempt.

use camino::Utf8PathBuf;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use docforge_config::Config;
use docforge_utils::error::LlmError;
use docforge_utils::types::StageId;

use crate::context::{GenerationContext, assemble_prompt};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::tracer::{FileTracer, InvocationTracer, TraceRecord};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// Per-call model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Stage being generated; used for logs and traces only
    pub stage: Option<StageId>,
}

impl GenerationParams {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: docforge_config::DEFAULT_TEMPERATURE,
            max_tokens: docforge_config::DEFAULT_MAX_TOKENS,
            stage: None,
        }
    }

    /// Effective settings for `stage`, honoring `[stages.<id>]` overrides.
    #[must_use]
    pub fn for_stage(config: &Config, stage: StageId) -> Self {
        Self {
            model: config.model_for_stage(stage),
            temperature: config.temperature_for_stage(stage),
            max_tokens: config.max_tokens_for_stage(stage),
            stage: Some(stage),
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(docforge_config::DEFAULT_MODEL)
    }
}

#[derive(Clone, Copy)]
enum SleepMode {
    Async,
    Blocking,
}

pub struct CompletionClient {
    backend: Arc<dyn LlmBackend>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    tracer: Option<Arc<dyn InvocationTracer>>,
    system_prompt: String,
    timeout: Duration,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("backend", &self.backend.name())
            .field("policy", &self.policy)
            .field("tracing", &self.tracer.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    /// Client with the default policy, real sleeps, no tracing and the
    /// built-in system prompt.
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            tracer: None,
            system_prompt: docforge_config::DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: Duration::from_secs(docforge_config::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Build a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the provider is unknown, the
    /// API key is missing or the trace directory is not valid UTF-8
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let backend = crate::backend_from_config(config)?;
        Self::from_config_with_backend(config, backend)
    }

    /// Apply configuration (policy, prompt, timeout, tracing) around an
    /// existing backend.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the trace directory is not valid UTF-8
    pub fn from_config_with_backend(
        config: &Config,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<Self, LlmError> {
        let mut client = Self::new(backend)
            .with_policy(RetryPolicy::from_config(config))
            .with_system_prompt(config.system_prompt())
            .with_timeout(config.request_timeout());

        if config.trace_model_io() {
            let dir = Utf8PathBuf::from_path_buf(config.trace_dir()).map_err(|p| {
                LlmError::Misconfiguration(format!(
                    "trace directory is not valid UTF-8: {}",
                    p.display()
                ))
            })?;
            client = client.with_tracer(Arc::new(FileTracer::new(dir)));
        }

        Ok(client)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_tracer(mut self, tracer: Arc<dyn InvocationTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate text for `prompt` in `context`.
    ///
    /// # Errors
    ///
    /// - `RateLimited` once `max_retries` retries are exhausted
    /// - `AuthenticationFailed`, `Timeout`, `Transport` on the first occurrence
    pub async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let invocation = self.build_invocation(prompt, context, params)?;
        self.invoke_with_retry(invocation, SleepMode::Async).await
    }

    /// Blocking variant of [`generate`](Self::generate) with the same retry
    /// semantics, driven by a private current-thread runtime.
    ///
    /// # Errors
    ///
    /// Same as `generate`, plus `Misconfiguration` when called from inside a
    /// Tokio runtime
    pub fn generate_blocking(
        &self,
        prompt: &str,
        context: &GenerationContext,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(LlmError::Misconfiguration(
                "generate_blocking cannot run inside an async runtime; use generate".to_string(),
            ));
        }

        let invocation = self.build_invocation(prompt, context, params)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to create runtime: {e}")))?;

        runtime.block_on(self.invoke_with_retry(invocation, SleepMode::Blocking))
    }

    fn build_invocation(
        &self,
        prompt: &str,
        context: &GenerationContext,
        params: &GenerationParams,
    ) -> Result<LlmInvocation, LlmError> {
        let full_prompt = assemble_prompt(prompt, context)?;
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(full_prompt),
        ];

        let chain: Vec<&str> = context
            .document_chain
            .iter()
            .map(|e| e.stage.as_str())
            .collect();

        let mut invocation = LlmInvocation::new(
            context.project_info.name.clone(),
            params.model.clone(),
            self.timeout,
            messages,
        )
        .with_sampling(params.temperature, params.max_tokens)
        .with_metadata("document_chain", serde_json::json!(chain));

        if let Some(stage) = params.stage {
            invocation = invocation.with_stage(stage);
        }
        Ok(invocation)
    }

    async fn invoke_with_retry(
        &self,
        invocation: LlmInvocation,
        mode: SleepMode,
    ) -> Result<String, LlmError> {
        let started = Instant::now();
        let mut retry = 0u32;

        loop {
            debug!(
                backend = self.backend.name(),
                project = %invocation.project,
                stage = ?invocation.stage,
                attempt = retry + 1,
                "Requesting completion"
            );

            match self.backend.invoke(invocation.clone()).await {
                Ok(result) => {
                    self.trace(&invocation, &result, started.elapsed());
                    return Ok(result.raw_response);
                }
                Err(err) if err.is_retryable() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry);
                    warn!(
                        project = %invocation.project,
                        stage = ?invocation.stage,
                        retry = retry + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited; backing off"
                    );
                    match mode {
                        SleepMode::Async => self.sleeper.sleep(delay).await,
                        SleepMode::Blocking => self.sleeper.sleep_blocking(delay),
                    }
                    retry += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(
                            project = %invocation.project,
                            stage = ?invocation.stage,
                            attempts = retry + 1,
                            "Rate limit retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    fn trace(&self, invocation: &LlmInvocation, result: &LlmResult, elapsed: Duration) {
        let Some(tracer) = &self.tracer else {
            return;
        };

        let record = TraceRecord {
            timestamp: Utc::now(),
            project: invocation.project.clone(),
            stage: invocation.stage,
            model: result.model_used.clone(),
            duration_ms: elapsed.as_millis(),
            prompt: invocation.user_prompt().unwrap_or_default().to_string(),
            messages: invocation.messages.clone(),
            response: result.raw_response.clone(),
            tokens_input: result.tokens_input,
            tokens_output: result.tokens_output,
        };

        if let Err(e) = tracer.record(&record) {
            warn!(error = %e, "Failed to record model trace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ChainEntry;
    use crate::test_support::{MemoryTracer, RecordingSleeper, ScriptedBackend};
    use crate::types::Role;
    use docforge_utils::types::ProjectInfo;

    fn context() -> GenerationContext {
        GenerationContext::new(ProjectInfo::new("shop", "online shop"))
    }

    fn client_with(backend: Arc<ScriptedBackend>, sleeper: Arc<RecordingSleeper>) -> CompletionClient {
        CompletionClient::new(backend).with_sleeper(sleeper)
    }

    fn rate_limited() -> LlmError {
        LlmError::RateLimited("rate limit exceeded".to_string())
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("doc".to_string())]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let out = client
            .generate("prompt", &context(), &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(out, "doc");
        assert_eq!(backend.invocations().len(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_then_success_backs_off_exponentially() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Ok("doc".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let out = client
            .generate("prompt", &context(), &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(out, "doc");
        assert_eq!(backend.invocations().len(), 3);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_makes_four_attempts() {
        let backend = Arc::new(ScriptedBackend::repeating(Err(rate_limited())));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let err = client
            .generate("prompt", &context(), &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::RateLimited(_)));
        assert_eq!(backend.invocations().len(), 4);
        assert_eq!(
            sleeper.sleeps(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(
            LlmError::AuthenticationFailed("invalid api key".to_string()),
        )]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let err = client
            .generate("prompt", &context(), &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::AuthenticationFailed(_)));
        assert_eq!(backend.invocations().len(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(LlmError::Transport(
            "connection reset".to_string(),
        ))]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let err = client
            .generate("prompt", &context(), &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Transport(_)));
        assert_eq!(backend.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_and_metadata() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("doc".to_string())]));
        let client = client_with(backend.clone(), Arc::new(RecordingSleeper::default()))
            .with_system_prompt("SYSTEM");
        let ctx = context().with_chain(vec![
            ChainEntry::new(StageId::Brainstorm, "a"),
            ChainEntry::new(StageId::RequirementConfirm, "b"),
        ]);
        let params = GenerationParams::new("gpt-4o").with_sampling(0.2, 512);

        client.generate("PROMPT", &ctx, &params).await.unwrap();

        let inv = &backend.invocations()[0];
        assert_eq!(inv.messages.len(), 2);
        assert_eq!(inv.messages[0].role, Role::System);
        assert_eq!(inv.messages[0].content, "SYSTEM");
        assert_eq!(inv.messages[1].role, Role::User);
        assert!(inv.messages[1].content.starts_with("PROMPT\n\n# Previous documents"));
        assert_eq!(inv.model, "gpt-4o");
        assert_eq!(inv.max_tokens, 512);
        assert_eq!(inv.project, "shop");
        assert_eq!(
            inv.metadata["document_chain"],
            serde_json::json!(["brainstorm", "requirement_confirm"])
        );
    }

    #[tokio::test]
    async fn test_tracer_records_success_only() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(rate_limited()),
            Ok("doc".to_string()),
        ]));
        let tracer = Arc::new(MemoryTracer::default());
        let client = client_with(backend, Arc::new(RecordingSleeper::default()))
            .with_tracer(tracer.clone());
        let mut params = GenerationParams::default();
        params.stage = Some(StageId::Prd);

        client.generate("P", &context(), &params).await.unwrap();

        let records = tracer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stage, Some(StageId::Prd));
        assert_eq!(records[0].response, "doc");
        assert!(records[0].prompt.starts_with("P\n\nContext:"));
    }

    #[tokio::test]
    async fn test_blocking_inside_runtime_is_rejected() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("doc".to_string())]));
        let client = client_with(backend.clone(), Arc::new(RecordingSleeper::default()));

        let err = client
            .generate_blocking("P", &context(), &GenerationParams::default())
            .unwrap_err();

        assert!(matches!(err, LlmError::Misconfiguration(_)));
        assert!(backend.invocations().is_empty());
    }

    #[test]
    fn test_blocking_uses_blocking_sleeps() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(rate_limited()),
            Ok("doc".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let client = client_with(backend.clone(), sleeper.clone());

        let out = client
            .generate_blocking("P", &context(), &GenerationParams::default())
            .unwrap();

        assert_eq!(out, "doc");
        assert_eq!(sleeper.blocking_sleeps(), vec![Duration::from_secs(2)]);
        assert!(sleeper.async_sleeps().is_empty());
    }

    #[test]
    fn test_params_for_stage_use_overrides() {
        let config = Config::builder()
            .model("gpt-4")
            .stage(
                StageId::Prd,
                docforge_config::StageConfig {
                    model: Some("gpt-4o".to_string()),
                    temperature: Some(0.1),
                    max_tokens: None,
                },
            )
            .build()
            .unwrap();

        let prd = GenerationParams::for_stage(&config, StageId::Prd);
        let other = GenerationParams::for_stage(&config, StageId::Workflow);

        assert_eq!(prd.model, "gpt-4o");
        assert_eq!(prd.temperature, 0.1);
        assert_eq!(prd.max_tokens, docforge_config::DEFAULT_MAX_TOKENS);
        assert_eq!(other.model, "gpt-4");
    }
}
