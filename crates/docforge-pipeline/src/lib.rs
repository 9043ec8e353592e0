//! Dependency-ordered document generation for docforge
//!
//! A [`Pipeline`] walks a [`StagePlan`], feeding each stage the documents of
//! the stages it depends on, generating through a
//! [`CompletionClient`](docforge_llm::CompletionClient) and saving every
//! completed document to a [`DocumentStore`](docforge_store::DocumentStore)
//! before moving on. [`PipelineHandle`] wraps it for synchronous callers.

mod handle;
mod pipeline;
mod plan;
mod progress;
mod state;

pub use handle::PipelineHandle;
pub use pipeline::Pipeline;
pub use plan::{StageDef, StagePlan};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressTracker, RecordingProgress};
pub use state::StageRecord;
