use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, read from `config.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub llm: LlmProviderConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
}

/// Per-turn pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Prior turns loaded into the context snapshot.
    pub history_limit: usize,
    /// Candidates requested from matching lookups before truncation.
    pub match_limit: usize,
    /// Caller-side timeout around each generation call.
    pub generation_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_limit: 5,
            match_limit: 5,
            generation_timeout_secs: 30,
        }
    }
}

/// Which hosted completion API to talk to, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmProviderConfig {
    /// `anthropic` or `openai`.
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 1024,
            temperature: Some(0.7),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Retention window used by `gow purge` when `--days` is not given.
    pub retention_days: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: crate::loader::default_config_dir().join("gow.db"),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3888,
        }
    }
}
