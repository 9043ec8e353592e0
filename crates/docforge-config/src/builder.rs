use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use docforge_utils::error::ConfigError;
use docforge_utils::types::StageId;

use super::{Config, ConfigSource, DebugConfig, Defaults, LlmConfig, PathsConfig, StageConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use docforge_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o")
    ///     .output_dir("/tmp/docforge-out")
    ///     .base_delay(Duration::from_millis(10))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.base_delay(), Duration::from_millis(10));
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// Reads neither the environment nor any config file. Values set here are
/// attributed to `ConfigSource::Programmatic`; everything else keeps its
/// built-in default.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    defaults: Defaults,
    llm: LlmConfig,
    paths: PathsConfig,
    debug: DebugConfig,
    stages: BTreeMap<StageId, StageConfig>,
    touched: Vec<&'static str>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.defaults.model = Some(model.into());
        self.touched.push("model");
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.defaults.temperature = Some(temperature);
        self.touched.push("temperature");
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.defaults.max_tokens = Some(max_tokens);
        self.touched.push("max_tokens");
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.defaults.request_timeout_secs = Some(timeout.as_secs());
        self.touched.push("request_timeout_secs");
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.defaults.system_prompt = Some(prompt.into());
        self.touched.push("system_prompt");
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.llm.base_url = Some(url.into());
        self.touched.push("base_url");
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.llm.api_key_env = Some(var.into());
        self.touched.push("api_key_env");
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.llm.max_retries = Some(retries);
        self.touched.push("max_retries");
        self
    }

    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.llm.base_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self.touched.push("base_delay_ms");
        self
    }

    #[must_use]
    pub fn prompts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.prompts_dir = Some(dir.into());
        self.touched.push("prompts_dir");
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.output_dir = Some(dir.into());
        self.touched.push("output_dir");
        self
    }

    #[must_use]
    pub fn trace_model_io(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug.trace_model_io = Some(true);
        self.debug.trace_dir = Some(dir.into());
        self.touched.push("trace_model_io");
        self.touched.push("trace_dir");
        self
    }

    #[must_use]
    pub fn stage(mut self, stage: StageId, config: StageConfig) -> Self {
        self.stages.insert(stage, config);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        for key in self.touched {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        }
        for stage in self.stages.keys() {
            source_attribution.insert(format!("stages.{stage}"), ConfigSource::Programmatic);
        }

        let config = Config {
            defaults: self.defaults,
            llm: self.llm,
            paths: self.paths,
            debug: self.debug,
            stages: self.stages,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
