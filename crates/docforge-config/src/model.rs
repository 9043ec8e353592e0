use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use docforge_utils::types::{ConfigSource, StageId};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TRACE_DIR: &str = ".docforge/traces";

/// System message sent ahead of every stage prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional documentation assistant. \
Produce high-quality documents that follow the format and requirements given by the user exactly.";

/// Providers the shipped backends can talk to.
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

/// Configuration for docforge.
///
/// Precedence: CLI arguments > environment > config file > built-in defaults.
///
/// # Discovery
///
/// [`Config::discover()`] searches for `.docforge/config.toml` upward from the
/// current directory, stopping at a repository root.
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `env`, `config`,
/// `programmatic`, or `default`) for `docforge config` output.
///
/// ```toml
/// [defaults]
/// model = "gpt-4o"
/// temperature = 0.5
///
/// [llm]
/// base_url = "https://llm.internal.example/v1"
/// max_retries = 5
///
/// [stages.dev_plan]
/// max_tokens = 8000
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub llm: LlmConfig,
    pub paths: PathsConfig,
    pub debug: DebugConfig,
    pub stages: BTreeMap<StageId, StageConfig>,
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[defaults]`: generation settings applied to every stage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub system_prompt: Option<String>,
}

/// `[llm]`: completion transport and retry policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key (never the key itself)
    pub api_key_env: Option<String>,
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

/// `[paths]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub prompts_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// `[debug]`: model I/O tracing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    pub trace_model_io: Option<bool>,
    pub trace_dir: Option<PathBuf>,
}

/// `[stages.<id>]`: per-stage overrides of the generation defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}
