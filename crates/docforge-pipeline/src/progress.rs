//! Progress callbacks for pipeline runs.

use camino::Utf8Path;
use std::sync::Mutex;
use tracing::{info, warn};

use docforge_utils::redaction::redact_error_message;
use docforge_utils::types::StageId;

/// Receives pipeline progress events.
///
/// Callbacks are invoked synchronously from the pipeline and must not block.
pub trait ProgressTracker: Send + Sync {
    fn run_started(&self, total: usize);

    /// `index` is the stage's zero-based position in the plan.
    fn stage_started(&self, stage: StageId, index: usize, total: usize);

    fn stage_saved(&self, stage: StageId, location: &Utf8Path);

    fn stage_failed(&self, stage: StageId, message: &str);

    fn run_finished(&self, completed: usize);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressTracker for NoopProgress {
    fn run_started(&self, _total: usize) {}
    fn stage_started(&self, _stage: StageId, _index: usize, _total: usize) {}
    fn stage_saved(&self, _stage: StageId, _location: &Utf8Path) {}
    fn stage_failed(&self, _stage: StageId, _message: &str) {}
    fn run_finished(&self, _completed: usize) {}
}

/// Emits each event as a `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressTracker for LogProgress {
    fn run_started(&self, total: usize) {
        info!(total = total, "Pipeline run started");
    }

    fn stage_started(&self, stage: StageId, index: usize, total: usize) {
        info!(stage = %stage, "[{}/{}] {}", index + 1, total, stage.title());
    }

    fn stage_saved(&self, stage: StageId, location: &Utf8Path) {
        info!(stage = %stage, location = %location, "Saved");
    }

    fn stage_failed(&self, stage: StageId, message: &str) {
        warn!(stage = %stage, error = %redact_error_message(message), "Stage failed");
    }

    fn run_finished(&self, completed: usize) {
        info!(completed = completed, "Pipeline run finished");
    }
}

/// One recorded progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted { total: usize },
    StageStarted { stage: StageId, index: usize, total: usize },
    StageSaved { stage: StageId, location: String },
    StageFailed { stage: StageId, message: String },
    RunFinished { completed: usize },
}

/// Collects events in memory, for callers that render progress after the fact.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressTracker for RecordingProgress {
    fn run_started(&self, total: usize) {
        self.push(ProgressEvent::RunStarted { total });
    }

    fn stage_started(&self, stage: StageId, index: usize, total: usize) {
        self.push(ProgressEvent::StageStarted { stage, index, total });
    }

    fn stage_saved(&self, stage: StageId, location: &Utf8Path) {
        self.push(ProgressEvent::StageSaved {
            stage,
            location: location.to_string(),
        });
    }

    fn stage_failed(&self, stage: StageId, message: &str) {
        self.push(ProgressEvent::StageFailed {
            stage,
            message: message.to_string(),
        });
    }

    fn run_finished(&self, completed: usize) {
        self.push(ProgressEvent::RunFinished { completed });
    }
}
