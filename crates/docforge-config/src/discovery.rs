use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use docforge_utils::error::ConfigError;
use docforge_utils::types::StageId;

use super::{CliArgs, Config, ConfigSource, DebugConfig, Defaults, LlmConfig, PathsConfig, StageConfig};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
    paths: Option<PathsConfig>,
    debug: Option<DebugConfig>,
    stages: Option<HashMap<String, StageConfig>>,
}

/// Model name overrides, highest priority first.
const MODEL_ENV_VARS: [&str; 2] = ["DOCFORGE_MODEL", "OPENAI_MODEL_NAME"];

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults.
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        Self::discover_with_env(start_dir, cli_args, |key| env::var(key).ok())
    }

    pub(crate) fn discover_with_env(
        start_dir: &Path,
        cli_args: &CliArgs,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut paths = PathsConfig::default();
        let mut debug = DebugConfig::default();
        let mut stages = BTreeMap::new();

        for key in [
            "model",
            "temperature",
            "max_tokens",
            "request_timeout_secs",
            "provider",
            "base_url",
            "api_key_env",
            "max_retries",
            "base_delay_ms",
            "prompts_dir",
            "output_dir",
            "trace_model_io",
            "trace_dir",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let base_dir = config_base_dir(path);
            let src = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), src);
                }
                if file_defaults.temperature.is_some() {
                    defaults.temperature = file_defaults.temperature;
                    source_attribution.insert("temperature".to_string(), src);
                }
                if file_defaults.max_tokens.is_some() {
                    defaults.max_tokens = file_defaults.max_tokens;
                    source_attribution.insert("max_tokens".to_string(), src);
                }
                if file_defaults.request_timeout_secs.is_some() {
                    defaults.request_timeout_secs = file_defaults.request_timeout_secs;
                    source_attribution.insert("request_timeout_secs".to_string(), src);
                }
                if file_defaults.system_prompt.is_some() {
                    defaults.system_prompt = file_defaults.system_prompt;
                    source_attribution.insert("system_prompt".to_string(), src);
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("provider".to_string(), src);
                }
                if file_llm.base_url.is_some() {
                    llm.base_url = file_llm.base_url;
                    source_attribution.insert("base_url".to_string(), src);
                }
                if file_llm.api_key_env.is_some() {
                    llm.api_key_env = file_llm.api_key_env;
                    source_attribution.insert("api_key_env".to_string(), src);
                }
                if file_llm.max_retries.is_some() {
                    llm.max_retries = file_llm.max_retries;
                    source_attribution.insert("max_retries".to_string(), src);
                }
                if file_llm.base_delay_ms.is_some() {
                    llm.base_delay_ms = file_llm.base_delay_ms;
                    source_attribution.insert("base_delay_ms".to_string(), src);
                }
            }

            if let Some(file_paths) = file_config.paths {
                if let Some(dir) = file_paths.prompts_dir {
                    paths.prompts_dir = Some(base_dir.join(dir));
                    source_attribution.insert("prompts_dir".to_string(), src);
                }
                if let Some(dir) = file_paths.output_dir {
                    paths.output_dir = Some(base_dir.join(dir));
                    source_attribution.insert("output_dir".to_string(), src);
                }
            }

            if let Some(file_debug) = file_config.debug {
                if file_debug.trace_model_io.is_some() {
                    debug.trace_model_io = file_debug.trace_model_io;
                    source_attribution.insert("trace_model_io".to_string(), src);
                }
                if let Some(dir) = file_debug.trace_dir {
                    debug.trace_dir = Some(base_dir.join(dir));
                    source_attribution.insert("trace_dir".to_string(), src);
                }
            }

            for (name, stage_config) in file_config.stages.unwrap_or_default() {
                let stage: StageId = name.parse().map_err(|_| ConfigError::InvalidValue {
                    key: format!("stages.{name}"),
                    value: "unknown stage".to_string(),
                })?;
                source_attribution.insert(format!("stages.{stage}"), src);
                stages.insert(stage, stage_config);
            }
        }

        // Environment overrides the file
        if let Some(model) = MODEL_ENV_VARS
            .iter()
            .find_map(|key| lookup_env(key).filter(|v| !v.trim().is_empty()))
        {
            defaults.model = Some(model);
            source_attribution.insert("model".to_string(), ConfigSource::Env);
        }
        if let Some(base_url) = lookup_env("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            llm.base_url = Some(base_url);
            source_attribution.insert("base_url".to_string(), ConfigSource::Env);
        }
        if let Some(dir) = lookup_env("DOCFORGE_OUTPUT_DIR").filter(|v| !v.trim().is_empty()) {
            paths.output_dir = Some(PathBuf::from(dir));
            source_attribution.insert("output_dir".to_string(), ConfigSource::Env);
        }
        if let Some(dir) = lookup_env("DOCFORGE_PROMPTS_DIR").filter(|v| !v.trim().is_empty()) {
            paths.prompts_dir = Some(PathBuf::from(dir));
            source_attribution.insert("prompts_dir".to_string(), ConfigSource::Env);
        }

        // CLI overrides everything
        if let Some(model) = &cli_args.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(temperature) = cli_args.temperature {
            defaults.temperature = Some(temperature);
            source_attribution.insert("temperature".to_string(), ConfigSource::Cli);
        }
        if let Some(max_tokens) = cli_args.max_tokens {
            defaults.max_tokens = Some(max_tokens);
            source_attribution.insert("max_tokens".to_string(), ConfigSource::Cli);
        }
        if let Some(base_url) = &cli_args.base_url {
            llm.base_url = Some(base_url.clone());
            source_attribution.insert("base_url".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.prompts_dir {
            paths.prompts_dir = Some(dir.clone());
            source_attribution.insert("prompts_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(dir) = &cli_args.output_dir {
            paths.output_dir = Some(dir.clone());
            source_attribution.insert("output_dir".to_string(), ConfigSource::Cli);
        }
        if cli_args.trace {
            debug.trace_model_io = Some(true);
            source_attribution.insert("trace_model_io".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            llm,
            paths,
            debug,
            stages,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Walk up from `start_dir` looking for `.docforge/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".docforge").join("config.toml");
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(e.to_string()))?;
        Ok(config)
    }

    /// Discover configuration from environment and filesystem without CLI overrides.
    pub fn discover_from_env_and_fs() -> Result<Self> {
        Self::discover(&CliArgs::default())
    }
}

/// Relative paths in a config file resolve against the directory that holds
/// `.docforge/`, or against the file's own directory for explicit paths.
fn config_base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or_else(|| Path::new("."));
    if parent.file_name().is_some_and(|name| name == ".docforge") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
