//! Completion client for docforge
//!
//! Backends implement [`LlmBackend`] and make a single attempt per call.
//! [`CompletionClient`] wraps a backend with prompt assembly, rate-limit
//! backoff and optional model I/O tracing.

mod client;
mod context;
pub(crate) mod http_client;
mod openai_backend;
mod retry;
mod tracer;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use client::{CompletionClient, GenerationParams};
pub use context::{ChainEntry, GenerationContext, assemble_prompt};
pub use openai_backend::OpenAiBackend;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use tracer::{FileTracer, InvocationTracer, TraceRecord};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use docforge_utils::error::LlmError;

use docforge_config::Config;
use std::sync::Arc;

/// Construct the backend named by `llm.provider`.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the provider is unknown or its
/// credentials are missing.
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match config.provider() {
        "openai" => Ok(Arc::new(OpenAiBackend::new_from_config(config)?)),
        other => Err(LlmError::Misconfiguration(format!(
            "Unknown completion provider '{other}'. Supported providers: {}",
            docforge_config::SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}
