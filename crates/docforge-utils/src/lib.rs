//! Foundation crate shared by every docforge component.
//!
//! Holds the closed stage vocabulary, the error taxonomy, exit codes,
//! atomic file writes, log setup and secret redaction.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

pub use error::{
    ConfigError, DocforgeError, ErrorCategory, LlmError, PipelineError, StoreError,
    UserFriendlyError,
};
pub use exit_codes::ExitCode;
pub use types::{ConfigSource, ParseStageError, ProjectInfo, StageId, StageStatus};
