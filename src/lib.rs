//! docforge - dependency-ordered LLM documentation pipeline
//!
//! docforge turns a short project description into a chain of planning
//! documents (brainstorm, requirements, PRD, workflow, tech stack, frontend,
//! backend, development plan). Each stage is generated with the documents of
//! the stages it depends on as context, saved immediately, and can be
//! snapshotted into immutable versions that are listed, compared and restored.
//!
//! docforge can be used in two ways:
//! - **CLI**: run `docforge generate <project>` and `docforge versions ...`
//! - **Library**: build a [`Pipeline`] (async) or [`PipelineHandle`] (blocking)
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! docforge generate shop --description "An online shop for handmade goods"
//! docforge versions checkpoint shop --label "first draft"
//! docforge versions list shop
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use docforge::{ConfigBuilder, PipelineHandle, ProjectInfo};
//!
//! let config = ConfigBuilder::new()
//!     .prompts_dir("prompts")
//!     .output_dir("output")
//!     .build()?;
//! let mut handle = PipelineHandle::from_config(&config)?;
//! let documents = handle.run(&ProjectInfo::new("shop", "An online shop"))?;
//! assert_eq!(documents.len(), 8);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Stable Public API
//!
//! - [`StageId`], [`StageStatus`], [`ProjectInfo`] - stage vocabulary and inputs
//! - [`Config`] and [`ConfigBuilder`] - configuration
//! - [`Pipeline`], [`PipelineHandle`], [`StagePlan`] - generation
//! - [`CompletionClient`], [`LlmBackend`], [`RetryPolicy`] - model access
//! - [`DocumentStore`] - persistence and versioning
//! - [`DocforgeError`] and [`ExitCode`] - errors and CLI exit codes

pub use docforge_config::{CliArgs, Config, ConfigBuilder, StageConfig};
pub use docforge_llm::{
    CompletionClient, FileTracer, GenerationContext, GenerationParams, InvocationTracer,
    LlmBackend, OpenAiBackend, RetryPolicy,
};
pub use docforge_pipeline::{
    LogProgress, NoopProgress, Pipeline, PipelineHandle, ProgressTracker, StageDef, StagePlan,
    StageRecord,
};
pub use docforge_prompts::{DirectoryPromptCatalog, PromptCatalog, StaticPromptCatalog};
pub use docforge_store::{DocumentStore, Documents, ReportFormat, VersionDiff, VersionMetadata};
pub use docforge_utils::error::{
    ConfigError, DocforgeError, LlmError, PipelineError, StoreError, UserFriendlyError,
};
pub use docforge_utils::exit_codes::ExitCode;
pub use docforge_utils::types::{ProjectInfo, StageId, StageStatus};

pub mod cli;
