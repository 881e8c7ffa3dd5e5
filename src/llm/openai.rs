//! OpenAI chat-completions client

use super::{Completion, CompletionRequest, LanguageModel};
use crate::error::AnalyzerError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(180))
            .build()?;

        // "openai/gpt-4o-mini" style names are accepted too
        let model = model
            .strip_prefix("openai/")
            .map(str::to_string)
            .unwrap_or(model);

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &CompletionRequest) -> crate::Result<Completion> {
        if self.api_key.is_empty() {
            return Err(AnalyzerError::LlmError(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, "Calling OpenAI chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                AnalyzerError::LlmError(format!("OpenAI API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI error response: {}", error_text);
            return Err(AnalyzerError::LlmError(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::LlmError(format!("OpenAI parse error: {}", e)))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AnalyzerError::LlmError("No choices in OpenAI response".to_string()))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AnalyzerError::LlmError(
                "Empty response from OpenAI".to_string(),
            ));
        }

        Ok(Completion {
            text,
            model: chat.model.unwrap_or_else(|| self.model.clone()),
            finish_reason: choice.finish_reason,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: &str) -> OpenAiClient {
        OpenAiClient::new(
            key.to_string(),
            "https://api.openai.com/v1/".to_string(),
            "openai/gpt-4o-mini".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_model_prefix_and_base_url() {
        let c = client("sk-test");
        assert_eq!(c.model(), "gpt-4o-mini");
        assert_eq!(c.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_request_has_system_and_user_messages() {
        let c = client("sk-test");
        let body = c.build_request(&CompletionRequest::new("persona", "task"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "task");
        assert_eq!(json["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"role": "assistant", "content": "{\"risks\": []}"}, "finish_reason": "stop"}]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"risks\": []}"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let result = client("").generate(&CompletionRequest::new("s", "p")).await;
        assert!(result.unwrap_err().to_string().contains("OPENAI_API_KEY"));
    }
}
