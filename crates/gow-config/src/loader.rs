use std::path::{Path, PathBuf};

use gow_common::{Error, Result};
use tracing::{info, warn};

use crate::model::AppConfig;

/// `~/.gow`, or `./.gow` when no home directory can be resolved.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".gow"))
        .unwrap_or_else(|| PathBuf::from(".gow"))
}

/// Resolves the YAML config file and layers environment overrides on top.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            path: default_config_dir().join("config.yml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file (defaults when it does not exist), then apply env overrides.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = if self.path.exists() {
            info!("loading config from {}", self.path.display());
            let content = std::fs::read_to_string(&self.path)?;
            parse_yaml(&content)?
        } else {
            warn!(
                "config file {} not found, using defaults",
                self.path.display()
            );
            AppConfig::default()
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_yaml(content: &str) -> Result<AppConfig> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| Error::Config(format!("invalid config file: {e}")))
}

/// Environment wins over the file. The provider-specific key is only used when
/// the file does not already carry one.
fn apply_env_overrides(config: &mut AppConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(provider) = env("GOW_LLM_PROVIDER") {
        config.llm.provider = provider;
    }
    if let Some(model) = env("GOW_MODEL") {
        config.llm.model = model;
    }
    if let Some(path) = env("GOW_DATABASE_PATH") {
        config.database.path = PathBuf::from(path);
    }

    if config.llm.api_key.is_none() {
        let key_var = match config.llm.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "ANTHROPIC_API_KEY",
        };
        config.llm.api_key = env(key_var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let loader = ConfigLoader::with_path("/nonexistent/gow/config.yml");
        let config = loader.load().unwrap();
        assert_eq!(config.agent.history_limit, 5);
        assert_eq!(config.gateway.port, 3888);
    }

    #[test]
    fn partial_yaml_keeps_section_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm:\n  provider: openai\n  model: gpt-4o-mini\nagent:\n  history_limit: 8"
        )
        .unwrap();

        let config = ConfigLoader::with_path(file.path()).load().unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.agent.history_limit, 8);
        assert_eq!(config.agent.generation_timeout_secs, 30);
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = parse_yaml("agent: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env_from(&[
                ("GOW_LLM_PROVIDER", "openai"),
                ("GOW_MODEL", "gpt-4o"),
                ("OPENAI_API_KEY", "sk-test"),
                ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ]),
        );
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn file_api_key_is_not_replaced_by_env() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("from-file".to_string());
        apply_env_overrides(&mut config, env_from(&[("ANTHROPIC_API_KEY", "from-env")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
    }
}
