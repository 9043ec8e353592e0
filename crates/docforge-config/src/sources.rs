use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.copied().unwrap_or(ConfigSource::Default).to_string()
}

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add(
            "model",
            self.defaults
                .model
                .clone()
                .unwrap_or_else(|| super::DEFAULT_MODEL.to_string()),
        );
        add(
            "temperature",
            self.defaults
                .temperature
                .unwrap_or(super::DEFAULT_TEMPERATURE)
                .to_string(),
        );
        add(
            "max_tokens",
            self.defaults
                .max_tokens
                .unwrap_or(super::DEFAULT_MAX_TOKENS)
                .to_string(),
        );
        add(
            "request_timeout_secs",
            self.request_timeout().as_secs().to_string(),
        );
        add("provider", self.provider().to_string());
        add("base_url", self.base_url().to_string());
        add("api_key_env", self.api_key_env().to_string());
        add("max_retries", self.max_retries().to_string());
        add(
            "base_delay_ms",
            self.base_delay().as_millis().to_string(),
        );
        add("prompts_dir", self.prompts_dir().display().to_string());
        add("output_dir", self.output_dir().display().to_string());
        add("trace_model_io", self.trace_model_io().to_string());
        add("trace_dir", self.trace_dir().display().to_string());

        for (stage, sc) in &self.stages {
            let key = format!("stages.{stage}");
            let mut parts = Vec::new();
            if let Some(model) = &sc.model {
                parts.push(format!("model={model}"));
            }
            if let Some(t) = sc.temperature {
                parts.push(format!("temperature={t}"));
            }
            if let Some(m) = sc.max_tokens {
                parts.push(format!("max_tokens={m}"));
            }
            add(&key, parts.join(", "));
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_labels_defaults() {
        let config = Config::minimal_for_testing();
        let effective = config.effective_config();

        assert_eq!(
            effective["model"],
            ("gpt-4".to_string(), "default".to_string())
        );
        assert_eq!(effective["max_retries"].0, "3");
    }

    #[test]
    fn test_effective_config_reports_source() {
        let mut config = Config::minimal_for_testing();
        config.defaults.model = Some("gpt-4o".to_string());
        config
            .source_attribution
            .insert("model".to_string(), ConfigSource::Cli);

        assert_eq!(
            config.effective_config()["model"],
            ("gpt-4o".to_string(), "cli".to_string())
        );
    }
}
