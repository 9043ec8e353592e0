use docforge_utils::error::ConfigError;

use super::{Config, SUPPORTED_PROVIDERS};

const MAX_TEMPERATURE: f32 = 2.0;
const MAX_RETRIES_LIMIT: u32 = 10;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

impl Config {
    /// Validate configuration values, reporting every problem at once.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let mut check_temperature = |key: &str, value: Option<f32>| {
            if let Some(t) = value
                && !(0.0..=MAX_TEMPERATURE).contains(&t)
            {
                errors.push(format!("{key} must be between 0.0 and {MAX_TEMPERATURE}, got {t}"));
            }
        };
        check_temperature("defaults.temperature", self.defaults.temperature);
        for (stage, sc) in &self.stages {
            check_temperature(&format!("stages.{stage}.temperature"), sc.temperature);
        }

        if self.defaults.max_tokens == Some(0) {
            errors.push("defaults.max_tokens must be greater than 0".to_string());
        }
        for (stage, sc) in &self.stages {
            if sc.max_tokens == Some(0) {
                errors.push(format!("stages.{stage}.max_tokens must be greater than 0"));
            }
        }

        if let Some(timeout) = self.defaults.request_timeout_secs
            && (timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS)
        {
            errors.push(format!(
                "defaults.request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"
            ));
        }

        if let Some(model) = &self.defaults.model
            && model.trim().is_empty()
        {
            errors.push("defaults.model must not be empty".to_string());
        }

        if !SUPPORTED_PROVIDERS.contains(&self.provider()) {
            errors.push(format!(
                "llm.provider '{}' is not supported (expected one of: {})",
                self.provider(),
                SUPPORTED_PROVIDERS.join(", ")
            ));
        }

        let base_url = self.base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(format!("llm.base_url '{base_url}' must be an http(s) URL"));
        }

        if self.max_retries() > MAX_RETRIES_LIMIT {
            errors.push(format!(
                "llm.max_retries exceeds maximum limit of {MAX_RETRIES_LIMIT}"
            ));
        }

        if self.api_key_env().trim().is_empty() {
            errors.push("llm.api_key_env must name an environment variable".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed {
                error_count: errors.len(),
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StageConfig;
    use docforge_utils::types::StageId;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::minimal_for_testing().validate().is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = Config::minimal_for_testing();
        config.defaults.temperature = Some(3.5);
        config.defaults.max_tokens = Some(0);
        config.llm.provider = Some("carrier-pigeon".to_string());
        config.llm.base_url = Some("ftp://example".to_string());

        match config.validate() {
            Err(ConfigError::ValidationFailed {
                errors,
                error_count,
            }) => {
                assert_eq!(error_count, 4);
                assert!(errors.iter().any(|e| e.contains("temperature")));
                assert!(errors.iter().any(|e| e.contains("carrier-pigeon")));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_stage_overrides_are_validated() {
        let mut config = Config::minimal_for_testing();
        config.stages.insert(
            StageId::Backend,
            StageConfig {
                model: None,
                temperature: Some(-0.1),
                max_tokens: Some(0),
            },
        );

        let err = config.validate().unwrap_err();

        assert!(matches!(err, ConfigError::ValidationFailed { error_count: 2, .. }));
    }
}
