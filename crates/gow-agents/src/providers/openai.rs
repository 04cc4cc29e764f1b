use super::{ChatMessage, ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse, Usage};
use async_trait::async_trait;
use gow_common::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| OPENAI_API_URL.to_string()),
        }
    }

    fn convert_request(&self, request: &LlmRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system_prompt) = &request.system {
            messages.push(OpenAiMessage {
                role: "system",
                content: system_prompt.clone(),
            });
        }

        messages.extend(request.messages.iter().map(convert_message));

        OpenAiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn convert_response(&self, response: OpenAiResponse) -> Result<LlmResponse> {
        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::Agent("No choices in response".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = &choice.message.content {
            content.push(ContentBlock::Text { text: text.clone() });
        }
        if choice.message.tool_calls.is_some() {
            content.push(ContentBlock::Unsupported {
                kind: "tool_calls".to_string(),
            });
        }

        Ok(LlmResponse {
            content,
            model: response.model.clone(),
            usage: response.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
            stop_reason: choice.finish_reason.clone(),
        })
    }
}

fn convert_message(msg: &ChatMessage) -> OpenAiMessage {
    let role = match msg.role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    };
    OpenAiMessage {
        role,
        content: msg.content.clone(),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let openai_request = self.convert_request(request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Agent(format!(
                "OpenAI API error: status={}, body={}",
                status.as_u16(),
                error_text
            )));
        }

        let openai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("Failed to parse OpenAI response: {e}")))?;

        self.convert_response(openai_response)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_becomes_first_message() {
        let provider = OpenAiProvider::new("k".to_string(), None);
        let request = LlmRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hola")],
            system: Some("Eres Gow".to_string()),
            max_tokens: Some(64),
            temperature: None,
        };

        let converted = serde_json::to_value(provider.convert_request(&request)).unwrap();
        assert_eq!(converted["messages"][0]["role"], "system");
        assert_eq!(converted["messages"][1]["content"], "hola");
        assert_eq!(converted["max_tokens"], 64);
        assert!(converted.get("temperature").is_none());
    }
}
