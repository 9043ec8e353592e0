//! Stage state machine.
//!
//! Each stage moves `Ready → Generating → {Completed | Failed}`. A stage runs
//! only once every dependency has a recorded artifact; its context carries
//! those artifacts in the order the plan declares them. Completed documents
//! are saved to the store before the stage is reported complete.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug};

use docforge_config::Config;
use docforge_llm::{ChainEntry, CompletionClient, GenerationContext, GenerationParams};
use docforge_prompts::{DirectoryPromptCatalog, PromptCatalog};
use docforge_store::{DocumentStore, Documents};
use docforge_utils::error::{ConfigError, DocforgeError, PipelineError};
use docforge_utils::logging::{log_stage_complete, log_stage_error, log_stage_start, stage_span};
use docforge_utils::types::{ProjectInfo, StageId, StageStatus};

use crate::plan::StagePlan;
use crate::progress::{NoopProgress, ProgressTracker};
use crate::state::{RunState, StageRecord};

/// Runs a [`StagePlan`] for one project at a time.
///
/// Methods that generate take `&mut self`: a run is strictly sequential.
/// Separate pipelines may run concurrently, including against the same store.
pub struct Pipeline {
    plan: StagePlan,
    config: Config,
    client: CompletionClient,
    store: DocumentStore,
    prompts: Arc<dyn PromptCatalog>,
    progress: Arc<dyn ProgressTracker>,
    state: RunState,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("plan", &self.plan)
            .field("client", &self.client)
            .field("store", &self.store)
            .field("statuses", &self.state.statuses())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline over the standard plan. Per-stage model settings come from `config`.
    pub fn new(
        config: &Config,
        client: CompletionClient,
        store: DocumentStore,
        prompts: Arc<dyn PromptCatalog>,
    ) -> Self {
        let plan = StagePlan::standard();
        let state = RunState::new(&plan);
        Self {
            plan,
            config: config.clone(),
            client,
            store,
            prompts,
            progress: Arc::new(NoopProgress),
            state,
        }
    }

    /// Build every collaborator from `config`: the configured backend, the
    /// store under `paths.output_dir` and prompts from `paths.prompts_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be constructed, a path is not
    /// valid UTF-8, or the prompts directory does not exist.
    pub fn from_config(config: &Config) -> Result<Self, DocforgeError> {
        let client = CompletionClient::from_config(config)?;
        let store = DocumentStore::new(utf8_path("paths.output_dir", config.output_dir())?);
        let prompts = DirectoryPromptCatalog::load(utf8_path(
            "paths.prompts_dir",
            config.prompts_dir(),
        )?)?;
        Ok(Self::new(config, client, store, Arc::new(prompts)))
    }

    /// Replace the plan. Clears all run state.
    #[must_use]
    pub fn with_plan(mut self, plan: StagePlan) -> Self {
        self.state = RunState::new(&plan);
        self.plan = plan;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[must_use]
    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Status of `stage`, or `None` if it is not part of the plan.
    #[must_use]
    pub fn status(&self, stage: StageId) -> Option<StageStatus> {
        self.state.get(stage).map(|r| r.status)
    }

    #[must_use]
    pub fn statuses(&self) -> BTreeMap<StageId, StageStatus> {
        self.state.statuses()
    }

    /// Artifacts recorded in this run, generated or seeded.
    #[must_use]
    pub fn artifacts(&self) -> Documents {
        self.state.artifacts()
    }

    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        self.state.records()
    }

    /// Forget all stage state and artifacts.
    pub fn reset(&mut self) {
        self.state = RunState::new(&self.plan);
    }

    /// Record an existing document for `stage` without generating it, so
    /// dependents can run. The stage's status is left unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidStage` if the stage is not in the plan, `AlreadyCompleted` if
    /// it was generated in this run.
    pub fn seed_artifact(
        &mut self,
        stage: StageId,
        content: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let record = self
            .state
            .get_mut(stage)
            .ok_or_else(|| PipelineError::InvalidStage {
                stage: stage.to_string(),
            })?;
        if record.status == StageStatus::Completed {
            return Err(PipelineError::AlreadyCompleted { stage });
        }
        record.artifact = Some(content.into());
        Ok(())
    }

    /// Generate one stage by name.
    ///
    /// # Errors
    ///
    /// `InvalidStage` for an unknown name; otherwise as [`generate_document`](Self::generate_document).
    pub async fn generate_document_named(
        &mut self,
        stage: &str,
        project: &ProjectInfo,
    ) -> Result<String, PipelineError> {
        let stage: StageId = stage.parse()?;
        self.generate_document(stage, project).await
    }

    /// Generate, record and save the document for `stage`.
    ///
    /// # Errors
    ///
    /// - `InvalidStage` if the stage is not in the plan
    /// - `AlreadyCompleted` if it was already generated in this run
    /// - `MissingDependency` if a dependency has no artifact; the stage is untouched
    /// - `Persistence` with `InvalidName` if the project name cannot be stored;
    ///   the stage is untouched
    /// - `PromptUnavailable`, `Llm` or `Persistence`; the stage is marked Failed
    pub async fn generate_document(
        &mut self,
        stage: StageId,
        project: &ProjectInfo,
    ) -> Result<String, PipelineError> {
        let span = stage_span(&project.name, stage.as_str());
        self.generate_document_inner(stage, project)
            .instrument(span)
            .await
    }

    async fn generate_document_inner(
        &mut self,
        stage: StageId,
        project: &ProjectInfo,
    ) -> Result<String, PipelineError> {
        let record = self
            .state
            .get(stage)
            .ok_or_else(|| PipelineError::InvalidStage {
                stage: stage.to_string(),
            })?;
        if record.status == StageStatus::Completed {
            return Err(PipelineError::AlreadyCompleted { stage });
        }

        let deps = record.deps.clone();
        let position = record.position;
        let missing: Vec<StageId> = deps
            .iter()
            .copied()
            .filter(|dep| self.state.artifact(*dep).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingDependency { stage, missing });
        }
        // unusable project names fail before any model call
        self.store
            .layout(&project.name)
            .map_err(|source| PipelineError::Persistence { stage, source })?;

        let total = self.plan.len();
        self.state.transition(stage, StageStatus::Generating);
        self.progress.stage_started(stage, position, total);
        log_stage_start(&project.name, stage.as_str(), position, total);
        let started = Instant::now();

        let Some(prompt) = self.prompts.get_prompt(stage) else {
            return Err(self.fail(project, stage, started, PipelineError::PromptUnavailable { stage }));
        };

        let chain: Vec<ChainEntry> = deps
            .iter()
            .filter_map(|dep| {
                self.state
                    .artifact(*dep)
                    .map(|content| ChainEntry::new(*dep, content))
            })
            .collect();
        debug!(chain = ?deps, "Assembled document chain");
        let context = GenerationContext::new(project.clone()).with_chain(chain);
        let params = GenerationParams::for_stage(&self.config, stage);

        let document = match self.client.generate(&prompt, &context, &params).await {
            Ok(document) => document,
            Err(source) => {
                return Err(self.fail(project, stage, started, PipelineError::Llm { stage, source }));
            }
        };

        if let Some(record) = self.state.get_mut(stage) {
            record.artifact = Some(document.clone());
        }

        let location = match self.store.save(&project.name, stage, &document) {
            Ok(location) => location,
            Err(source) => {
                if let Some(record) = self.state.get_mut(stage) {
                    record.artifact = None;
                }
                return Err(self.fail(
                    project,
                    stage,
                    started,
                    PipelineError::Persistence { stage, source },
                ));
            }
        };

        self.state.transition(stage, StageStatus::Completed);
        if let Some(record) = self.state.get_mut(stage) {
            record.location = Some(location.clone());
        }
        self.progress.stage_saved(stage, &location);
        log_stage_complete(
            &project.name,
            stage.as_str(),
            started.elapsed().as_millis(),
            document.len(),
        );
        Ok(document)
    }

    fn fail(
        &mut self,
        project: &ProjectInfo,
        stage: StageId,
        started: Instant,
        error: PipelineError,
    ) -> PipelineError {
        self.state.transition(stage, StageStatus::Failed);
        let message = error.to_string();
        self.progress.stage_failed(stage, &message);
        log_stage_error(
            &project.name,
            stage.as_str(),
            &message,
            started.elapsed().as_millis(),
        );
        error
    }

    /// Generate every stage of the plan in order, skipping stages already
    /// completed in this run. Stops at the first error; earlier stages stay
    /// saved.
    ///
    /// # Errors
    ///
    /// The first error returned by [`generate_document`](Self::generate_document).
    pub async fn generate_all(&mut self, project: &ProjectInfo) -> Result<Documents, PipelineError> {
        self.progress.run_started(self.plan.len());

        let stages: Vec<StageId> = self.plan.stages().iter().map(|def| def.stage).collect();
        for stage in stages {
            if self.status(stage) == Some(StageStatus::Completed) {
                debug!(stage = %stage, "Already completed in this run; skipping");
                continue;
            }
            if let Err(err) = self.generate_document(stage, project).await {
                self.progress.run_finished(self.state.completed_count());
                return Err(err);
            }
        }

        self.progress.run_finished(self.state.completed_count());
        Ok(self.artifacts())
    }

    /// Fresh generation: clear all run state, then [`generate_all`](Self::generate_all).
    ///
    /// # Errors
    ///
    /// As `generate_all`.
    pub async fn run(&mut self, project: &ProjectInfo) -> Result<Documents, PipelineError> {
        self.reset();
        self.generate_all(project).await
    }
}

fn utf8_path(key: &str, path: std::path::PathBuf) -> Result<Utf8PathBuf, ConfigError> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| ConfigError::InvalidValue {
        key: key.to_string(),
        value: format!("{} (path is not valid UTF-8)", path.display()),
    })
}
