//! Core vocabulary shared across docforge crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifies one document-generation stage.
///
/// The set of stages is closed. Every mapping on this type (string id,
/// title, filename, prompt filename, default dependencies) is an exhaustive
/// `match`, so adding a variant without filling in its mappings fails to
/// compile rather than falling back to a guessed default.
///
/// Variants are declared in pipeline order and `Ord` follows that order.
///
/// # Example
///
/// ```rust
/// use docforge_utils::types::StageId;
///
/// let stage: StageId = "tech_stack".parse().unwrap();
/// assert_eq!(stage, StageId::TechStack);
/// assert_eq!(stage.filename(), "04-tech-stack.md");
/// assert!(StageId::Prd < StageId::DevPlan);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Free-form ideation around the project concept
    Brainstorm,
    /// Confirmed requirement list distilled from the brainstorm
    RequirementConfirm,
    /// Product requirements document
    Prd,
    /// Application workflow and user journeys
    Workflow,
    /// Technology stack selection
    TechStack,
    /// Frontend design guide
    Frontend,
    /// Backend architecture
    Backend,
    /// Development plan
    DevPlan,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [StageId; 8] = [
        StageId::Brainstorm,
        StageId::RequirementConfirm,
        StageId::Prd,
        StageId::Workflow,
        StageId::TechStack,
        StageId::Frontend,
        StageId::Backend,
        StageId::DevPlan,
    ];

    /// Stable string id used in config keys, manifests and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StageId::Brainstorm => "brainstorm",
            StageId::RequirementConfirm => "requirement_confirm",
            StageId::Prd => "prd",
            StageId::Workflow => "workflow",
            StageId::TechStack => "tech_stack",
            StageId::Frontend => "frontend",
            StageId::Backend => "backend",
            StageId::DevPlan => "dev_plan",
        }
    }

    /// Human-readable title, used as the heading in a document chain.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            StageId::Brainstorm => "Brainstorm",
            StageId::RequirementConfirm => "Requirement Confirmation",
            StageId::Prd => "Product Requirements Document (PRD)",
            StageId::Workflow => "Application Workflow",
            StageId::TechStack => "Technology Stack",
            StageId::Frontend => "Frontend Design Guide",
            StageId::Backend => "Backend Architecture",
            StageId::DevPlan => "Development Plan",
        }
    }

    /// Filename of this stage's artifact inside `current/` and version directories.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            StageId::Brainstorm => "00-brainstorm.md",
            StageId::RequirementConfirm => "01-requirement-confirm.md",
            StageId::Prd => "02-prd.md",
            StageId::Workflow => "03-workflow.md",
            StageId::TechStack => "04-tech-stack.md",
            StageId::Frontend => "05-frontend.md",
            StageId::Backend => "06-backend.md",
            StageId::DevPlan => "07-dev-plan.md",
        }
    }

    /// Filename of this stage's prompt template inside a prompts directory.
    #[must_use]
    pub const fn prompt_filename(self) -> &'static str {
        match self {
            StageId::Brainstorm => "0.brainstorm.md",
            StageId::RequirementConfirm => "1.requirement-confirm.md",
            StageId::Prd => "2.prd.md",
            StageId::Workflow => "3.workflow.md",
            StageId::TechStack => "4.tech-stack.md",
            StageId::Frontend => "5.frontend.md",
            StageId::Backend => "6.backend.md",
            StageId::DevPlan => "7.dev-plan.md",
        }
    }

    /// Zero-based position in the standard pipeline order.
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// Dependencies of this stage in the standard plan, in declaration order.
    #[must_use]
    pub const fn default_dependencies(self) -> &'static [StageId] {
        use StageId::*;
        match self {
            Brainstorm => &[],
            RequirementConfirm => &[Brainstorm],
            Prd => &[Brainstorm, RequirementConfirm],
            Workflow => &[Brainstorm, RequirementConfirm, Prd],
            TechStack => &[Brainstorm, RequirementConfirm, Prd, Workflow],
            Frontend | Backend => &[Brainstorm, RequirementConfirm, Prd, Workflow, TechStack],
            DevPlan => &[
                Brainstorm,
                RequirementConfirm,
                Prd,
                Workflow,
                TechStack,
                Frontend,
                Backend,
            ],
        }
    }

    /// Reverse of [`filename`](Self::filename). Unknown names yield `None`.
    #[must_use]
    pub fn from_filename(name: &str) -> Option<StageId> {
        StageId::ALL.into_iter().find(|s| s.filename() == name)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage '{0}'")]
pub struct ParseStageError(pub String);

impl FromStr for StageId {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StageId::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// Status of a stage within one pipeline run.
///
/// ```text
/// Ready ──► Generating ──► Completed
///   ▲           │
///   │           ▼
///   └────── Failed ──► Generating (retry by caller)
/// ```
///
/// `Paused` is part of the vocabulary so persisted status files and external
/// dashboards can name it, but no transition produces or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Ready,
    Generating,
    Paused,
    Completed,
    Failed,
}

impl StageStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StageStatus::Ready => "ready",
            StageStatus::Generating => "generating",
            StageStatus::Paused => "paused",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::Ready, StageStatus::Generating)
                | (StageStatus::Failed, StageStatus::Generating)
                | (StageStatus::Generating, StageStatus::Completed)
                | (StageStatus::Generating, StageStatus::Failed)
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied project metadata threaded into every stage prompt.
///
/// `name` also names the project's directory in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Free-form metadata (target users, constraints, ...), serialized in key order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Where an effective configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Cli,
    Env,
    Config,
    Programmatic,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Cli => write!(f, "cli"),
            ConfigSource::Env => write!(f, "env"),
            ConfigSource::Config => write!(f, "config"),
            ConfigSource::Programmatic => write!(f, "programmatic"),
            ConfigSource::Default => write!(f, "default"),
        }
    }
}
