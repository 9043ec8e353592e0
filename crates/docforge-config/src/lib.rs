//! Configuration management for docforge
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. The TOML file supports `[defaults]`,
//! `[llm]`, `[paths]`, `[debug]` and `[stages.<id>]` sections.
//!
//! There is no process-wide configuration instance; callers build a
//! [`Config`] and hand the pieces each component needs to its constructor.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use docforge_utils::types::ConfigSource;

use docforge_utils::types::StageId;
use std::path::PathBuf;
use std::time::Duration;

impl Config {
    /// Model for `stage`: stage override > `[defaults].model` > `gpt-4`.
    #[must_use]
    pub fn model_for_stage(&self, stage: StageId) -> String {
        self.stages
            .get(&stage)
            .and_then(|sc| sc.model.clone())
            .or_else(|| self.defaults.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    #[must_use]
    pub fn temperature_for_stage(&self, stage: StageId) -> f32 {
        self.stages
            .get(&stage)
            .and_then(|sc| sc.temperature)
            .or(self.defaults.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    #[must_use]
    pub fn max_tokens_for_stage(&self, stage: StageId) -> u32 {
        self.stages
            .get(&stage)
            .and_then(|sc| sc.max_tokens)
            .or(self.defaults.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.defaults
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.defaults
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.llm.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn api_key_env(&self) -> &str {
        self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.llm.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.llm.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS))
    }

    #[must_use]
    pub fn prompts_dir(&self) -> PathBuf {
        self.paths
            .prompts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR))
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    #[must_use]
    pub fn trace_model_io(&self) -> bool {
        self.debug.trace_model_io.unwrap_or(false)
    }

    #[must_use]
    pub fn trace_dir(&self) -> PathBuf {
        self.debug
            .trace_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACE_DIR))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a Config with every value at its built-in default.
    ///
    /// Unlike discovery this reads neither the environment nor the filesystem.
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
            debug: DebugConfig::default(),
            stages: std::collections::BTreeMap::new(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
