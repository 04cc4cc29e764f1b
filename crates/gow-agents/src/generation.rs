use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::providers::{ChatMessage, LlmProvider, LlmRequest};

/// Why a generation call produced no usable text.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation returned no text")]
    EmptyResponse,
}

/// Single-shot, stateless text generation. Implementations make exactly one
/// upstream call and never retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Generation over any [`LlmProvider`]: the prompt is sent as one user message.
pub struct ProviderGenerationClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl ProviderGenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }
}

#[async_trait]
impl GenerationClient for ProviderGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = LlmRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            system: None,
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        };

        let response =
            self.provider
                .complete(&request)
                .await
                .map_err(|e| GenerationError::Provider {
                    provider: self.provider.provider_id().to_string(),
                    message: e.to_string(),
                })?;

        if let Some(usage) = &response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "generation completed"
            );
        }

        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Caller-side deadline around another client. An expired deadline is a
/// [`GenerationError::Timeout`].
pub struct WithTimeout {
    inner: Arc<dyn GenerationClient>,
    timeout: Duration,
}

impl WithTimeout {
    pub fn new(inner: Arc<dyn GenerationClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl GenerationClient for WithTimeout {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tokio::time::timeout(self.timeout, self.inner.generate(prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
    }
}
