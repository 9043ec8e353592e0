//! Blocking façade over [`Pipeline`].
//!
//! For callers without an async runtime (the CLI, scripts, tests). The
//! handle owns a current-thread Tokio runtime; backoff sleeps block the
//! calling thread.
//!
//! ```rust,no_run
//! use docforge_config::{CliArgs, Config};
//! use docforge_pipeline::PipelineHandle;
//! use docforge_utils::types::ProjectInfo;
//!
//! let config = Config::discover(&CliArgs::default())?;
//! let mut handle = PipelineHandle::from_config(&config)?;
//! let docs = handle.run(&ProjectInfo::new("shop", "An online shop"))?;
//! println!("generated {} documents", docs.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use tokio::runtime::{Builder, Runtime};

use docforge_config::Config;
use docforge_store::Documents;
use docforge_utils::error::{DocforgeError, PipelineError};
use docforge_utils::types::{ProjectInfo, StageId};

use crate::pipeline::Pipeline;

/// Synchronous entry point for running a [`Pipeline`].
///
/// Methods that generate take `&mut self`, like the pipeline itself.
/// Must not be used from inside another Tokio runtime.
#[derive(Debug)]
pub struct PipelineHandle {
    pipeline: Pipeline,
    runtime: Runtime,
}

impl PipelineHandle {
    /// # Errors
    ///
    /// Returns `DocforgeError::Io` if the runtime cannot be created.
    pub fn new(pipeline: Pipeline) -> Result<Self, DocforgeError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { pipeline, runtime })
    }

    /// Build the pipeline from `config`; see [`Pipeline::from_config`].
    ///
    /// # Errors
    ///
    /// As `Pipeline::from_config`, plus runtime creation failures.
    pub fn from_config(config: &Config) -> Result<Self, DocforgeError> {
        Self::new(Pipeline::from_config(config)?)
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// # Errors
    ///
    /// As [`Pipeline::generate_document`].
    pub fn generate_document(
        &mut self,
        stage: StageId,
        project: &ProjectInfo,
    ) -> Result<String, PipelineError> {
        self.runtime
            .block_on(self.pipeline.generate_document(stage, project))
    }

    /// # Errors
    ///
    /// As [`Pipeline::generate_all`].
    pub fn generate_all(&mut self, project: &ProjectInfo) -> Result<Documents, PipelineError> {
        self.runtime.block_on(self.pipeline.generate_all(project))
    }

    /// # Errors
    ///
    /// As [`Pipeline::run`].
    pub fn run(&mut self, project: &ProjectInfo) -> Result<Documents, PipelineError> {
        self.runtime.block_on(self.pipeline.run(project))
    }

    pub fn into_inner(self) -> Pipeline {
        self.pipeline
    }
}
