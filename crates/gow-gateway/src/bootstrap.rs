use std::sync::Arc;
use std::time::Duration;

use gow_agents::{
    AnthropicProvider, GowAgent, LlmProvider, OpenAiProvider, ProviderGenerationClient,
};
use gow_common::{Error, Result};
use gow_config::{AppConfig, DatabaseConfig, LlmProviderConfig};
use gow_db::{ContextStore, SqliteContextStore};
use tracing::{info, warn};

/// Construct the completion provider named in the config.
pub fn build_provider(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty());

    let provider: Arc<dyn LlmProvider> = match config.provider.as_str() {
        "anthropic" => {
            let api_key = api_key.ok_or_else(|| {
                Error::Config("ANTHROPIC_API_KEY not set and llm.api_key is empty".to_string())
            })?;
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                Error::Config("OPENAI_API_KEY not set and llm.api_key is empty".to_string())
            })?;
            Arc::new(OpenAiProvider::new(api_key, config.base_url.clone()))
        }
        other => {
            return Err(Error::Config(format!(
                "unknown llm provider '{other}' (expected 'anthropic' or 'openai')"
            )));
        }
    };

    info!(
        "registered llm provider: {} (model {})",
        provider.provider_id(),
        config.model
    );
    Ok(provider)
}

/// Open the SQLite context store, creating its parent directory if needed.
pub fn open_store(config: &DatabaseConfig) -> Result<Arc<SqliteContextStore>> {
    if let Some(parent) = config.path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SqliteContextStore::open(&config.path)?))
}

/// Open the context store for answering turns. An unusable store only costs
/// personalization, so the error is logged and the agent runs without one.
pub fn open_store_or_degrade(config: &DatabaseConfig) -> Option<Arc<dyn ContextStore>> {
    match open_store(config) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(
                "context store at {} unavailable, answering without stored context: {e}",
                config.path.display()
            );
            None
        }
    }
}

/// Wire a [`GowAgent`] from configuration.
pub fn build_agent(config: &AppConfig, store: Option<Arc<dyn ContextStore>>) -> Result<GowAgent> {
    let provider = build_provider(&config.llm)?;
    let generator = ProviderGenerationClient::new(provider, config.llm.model.clone())
        .with_max_tokens(config.llm.max_tokens)
        .with_temperature(config.llm.temperature);

    let mut agent = GowAgent::new(Arc::new(generator))
        .with_history_limit(config.agent.history_limit)
        .with_match_limit(config.agent.match_limit)
        .with_generation_timeout(Duration::from_secs(config.agent.generation_timeout_secs));
    if let Some(store) = store {
        agent = agent.with_store(store);
    }
    Ok(agent)
}
