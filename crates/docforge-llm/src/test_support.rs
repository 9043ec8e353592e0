//! In-memory backends, sleepers and tracers for tests.
//!
//! Available under `cfg(test)` and the `test-utils` feature.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use docforge_utils::error::LlmError;

use crate::retry::Sleeper;
use crate::tracer::{InvocationTracer, TraceRecord};
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Replays a fixed script of outcomes, one per call.
///
/// Once the script is exhausted the optional fallback outcome is returned
/// forever; without one, further calls fail with `Transport`.
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<Result<String, LlmError>>,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Return `outcome` on every call.
    pub fn repeating(outcome: Result<String, LlmError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(outcome),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        self.invocations.lock().unwrap().push(inv);

        let next = self.script.lock().unwrap().pop_front();
        let outcome = match (next, &self.fallback) {
            (Some(outcome), _) => outcome,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => Err(LlmError::Transport("scripted backend exhausted".to_string())),
        };

        outcome.map(|text| LlmResult::new(text, "scripted", model))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Produces a stable document derived from the project and stage.
///
/// The text depends only on the invocation, so repeated runs over the same
/// inputs yield byte-identical outputs.
#[derive(Debug, Default)]
pub struct DeterministicBackend {
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl DeterministicBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Output the backend returns for `inv`.
    pub fn render(inv: &LlmInvocation) -> String {
        let stage = inv.stage.map_or("adhoc", |s| s.as_str());
        let chain = inv
            .metadata
            .get("document_chain")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        format!(
            "# {stage} for {}\n\nBuilt on: [{chain}]\n\n## Summary\n\nGenerated by {}.\n",
            inv.project, inv.model
        )
    }
}

#[async_trait]
impl LlmBackend for DeterministicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let text = Self::render(&inv);
        let model = inv.model.clone();
        self.invocations.lock().unwrap().push(inv);
        Ok(LlmResult::new(text, "deterministic", model))
    }

    fn name(&self) -> &str {
        "deterministic"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SleepKind {
    Async,
    Blocking,
}

/// Records requested waits and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<(SleepKind, Duration)>>,
}

impl RecordingSleeper {
    /// All waits in request order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }

    pub fn async_sleeps(&self) -> Vec<Duration> {
        self.filtered(SleepKind::Async)
    }

    pub fn blocking_sleeps(&self) -> Vec<Duration> {
        self.filtered(SleepKind::Blocking)
    }

    fn filtered(&self, kind: SleepKind) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, d)| *d)
            .collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push((SleepKind::Async, duration));
    }

    fn sleep_blocking(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap()
            .push((SleepKind::Blocking, duration));
    }
}

/// Keeps trace records in memory.
#[derive(Debug, Default)]
pub struct MemoryTracer {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemoryTracer {
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl InvocationTracer for MemoryTracer {
    fn record(&self, record: &TraceRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
