use super::{ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse, Usage};
use async_trait::async_trait;
use gow_common::{Error, Result};
use reqwest::Client;
use serde_json::json;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const HEALTH_CHECK_MODEL: &str = "claude-3-5-haiku-latest";

pub struct AnthropicProvider {
    api_key: String,
    client: Client,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn create_request_body(&self, request: &LlmRequest) -> Result<serde_json::Value> {
        let mut messages = Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            let role = match msg.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
                ChatRole::System => {
                    return Err(Error::Agent(
                        "System messages should be passed via the `system` field, not in `messages`"
                            .to_string(),
                    ));
                }
            };
            messages.push(json!({ "role": role, "content": msg.content }));
        }

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(1024),
        });

        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        Ok(body)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = self.create_request_body(request)?;

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("Network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Agent(format!(
                "Anthropic API error: status={}, body={}",
                status.as_u16(),
                error_text
            )));
        }

        let raw_response: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("Failed to parse Anthropic response: {e}")))?;

        let content = raw_response["content"]
            .as_array()
            .ok_or_else(|| Error::Agent("Missing content".to_string()))?
            .iter()
            .map(|block| match block["type"].as_str().unwrap_or_default() {
                "text" => ContentBlock::Text {
                    text: block["text"].as_str().unwrap_or_default().to_string(),
                },
                other => ContentBlock::Unsupported {
                    kind: other.to_string(),
                },
            })
            .collect();

        let usage = raw_response["usage"].as_object().map(|u| Usage {
            input_tokens: u["input_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["output_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(LlmResponse {
            content,
            model: raw_response["model"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            usage,
            stop_reason: raw_response["stop_reason"].as_str().map(str::to_string),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let body = json!({
            "model": HEALTH_CHECK_MODEL,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "ping"}]
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
