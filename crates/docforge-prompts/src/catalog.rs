use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use docforge_utils::atomic_write::read_file_with_crlf_tolerance;
use docforge_utils::error::ConfigError;
use docforge_utils::types::StageId;

use crate::validation::{header_count, validate_prompt};

/// Read-only source of stage prompts.
pub trait PromptCatalog: Send + Sync {
    /// Prompt text for `stage`, or `None` if no valid prompt is available.
    fn get_prompt(&self, stage: StageId) -> Option<String>;

    fn is_available(&self, stage: StageId) -> bool {
        self.get_prompt(stage).is_some()
    }
}

/// Statistics about a loaded prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSummary {
    pub stage: StageId,
    pub filename: &'static str,
    pub word_count: usize,
    pub header_count: usize,
    pub first_header: Option<String>,
}

impl PromptSummary {
    fn new(stage: StageId, content: &str) -> Self {
        Self {
            stage,
            filename: stage.prompt_filename(),
            word_count: content.split_whitespace().count(),
            header_count: header_count(content),
            first_header: content
                .lines()
                .find(|line| line.starts_with('#') && line.trim_start_matches('#').starts_with(' '))
                .map(str::to_string),
        }
    }
}

/// Prompts read from `<dir>/<stage prompt filename>`.
///
/// Missing or invalid files are logged and leave the stage without a prompt.
#[derive(Debug, Clone)]
pub struct DirectoryPromptCatalog {
    dir: Utf8PathBuf,
    prompts: BTreeMap<StageId, String>,
}

impl DirectoryPromptCatalog {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for `paths.prompts_dir` when `dir`
    /// is not an existing directory
    pub fn load(dir: impl Into<Utf8PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ConfigError::InvalidValue {
                key: "paths.prompts_dir".to_string(),
                value: format!("{dir} (directory not found)"),
            });
        }

        let mut catalog = Self {
            dir,
            prompts: BTreeMap::new(),
        };
        for stage in StageId::ALL {
            catalog.reload(stage);
        }
        info!(
            dir = %catalog.dir,
            loaded = catalog.prompts.len(),
            total = StageId::ALL.len(),
            "Loaded stage prompts"
        );
        Ok(catalog)
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Re-read the prompt for `stage` from disk; returns whether it is now available.
    pub fn reload(&mut self, stage: StageId) -> bool {
        self.prompts.remove(&stage);
        let path = self.dir.join(stage.prompt_filename());

        if !path.is_file() {
            warn!(stage = %stage, path = %path, "Prompt file not found");
            return false;
        }

        let content = match read_file_with_crlf_tolerance(&path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                warn!(stage = %stage, path = %path, error = %e, "Failed to read prompt file");
                return false;
            }
        };

        if content.is_empty() {
            warn!(stage = %stage, path = %path, "Prompt file is empty");
            return false;
        }

        if let Err(issues) = validate_prompt(&content) {
            warn!(
                stage = %stage,
                path = %path,
                issues = %issues.join("; "),
                "Prompt failed validation"
            );
            return false;
        }

        debug!(stage = %stage, path = %path, "Prompt loaded");
        self.prompts.insert(stage, content);
        true
    }

    /// Stages with a valid prompt, in pipeline order.
    #[must_use]
    pub fn available(&self) -> Vec<StageId> {
        self.prompts.keys().copied().collect()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<PromptSummary> {
        self.prompts
            .iter()
            .map(|(stage, content)| PromptSummary::new(*stage, content))
            .collect()
    }
}

impl PromptCatalog for DirectoryPromptCatalog {
    fn get_prompt(&self, stage: StageId) -> Option<String> {
        self.prompts.get(&stage).cloned()
    }
}

/// In-memory prompts. No validation is applied.
#[derive(Debug, Clone, Default)]
pub struct StaticPromptCatalog {
    prompts: BTreeMap<StageId, String>,
}

impl StaticPromptCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The same prompt for every stage.
    #[must_use]
    pub fn uniform(prompt: &str) -> Self {
        StageId::ALL
            .into_iter()
            .map(|stage| (stage, prompt.to_string()))
            .collect()
    }

    #[must_use]
    pub fn with_prompt(mut self, stage: StageId, prompt: impl Into<String>) -> Self {
        self.prompts.insert(stage, prompt.into());
        self
    }
}

impl FromIterator<(StageId, String)> for StaticPromptCatalog {
    fn from_iter<I: IntoIterator<Item = (StageId, String)>>(iter: I) -> Self {
        Self {
            prompts: iter.into_iter().collect(),
        }
    }
}

impl PromptCatalog for StaticPromptCatalog {
    fn get_prompt(&self, stage: StageId) -> Option<String> {
        self.prompts.get(&stage).cloned()
    }
}
