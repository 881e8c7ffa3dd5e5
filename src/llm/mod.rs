//! Language model providers
//!
//! Agents talk to the model through the `LanguageModel` trait so the crew
//! does not care which vendor answers.

use crate::config::{AppConfig, LlmProvider};
use crate::error::AnalyzerError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model(&self) -> &str;
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Build the provider selected by `LLM_PROVIDER`.
pub fn build_language_model(config: &AppConfig) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.llm_provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.llm_model.clone(),
        )?),
        LlmProvider::Gemini => Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.llm_model.clone(),
        )?),
        LlmProvider::Mock => Arc::new(MockLanguageModel::new()),
    };
    Ok(model)
}

/// Offline model for development & testing.
///
/// Returns queued responses first, then a canned answer naming the agent
/// taken from the first line of the system prompt.
pub struct MockLanguageModel {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    failure: Option<String>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Self::new()
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Requests seen so far, in call order
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<Completion> {
        let call_number = {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            requests.len()
        };

        if let Some(reason) = &self.failure {
            return Err(AnalyzerError::LlmError(reason.clone()));
        }

        let text = match self.responses.lock().await.pop_front() {
            Some(text) => text,
            None => {
                let persona = request.system.lines().next().unwrap_or_default();
                format!("Mock response {} from {}", call_number, persona)
            }
        };

        Ok(Completion {
            text,
            model: "mock".to_string(),
            finish_reason: Some("stop".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_queue_then_canned() {
        let mock = MockLanguageModel::with_responses(["first"]);
        let request = CompletionRequest::new("You are Investment Advisor.", "hello");

        let first = mock.generate(&request).await.unwrap();
        assert_eq!(first.text, "first");

        let second = mock.generate(&request).await.unwrap();
        assert_eq!(second.text, "Mock response 2 from You are Investment Advisor.");
        assert_eq!(mock.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockLanguageModel::failing("quota exceeded");
        let result = mock.generate(&CompletionRequest::new("s", "p")).await;
        assert!(matches!(result, Err(AnalyzerError::LlmError(_))));
    }

    #[test]
    fn test_build_mock_provider() {
        let config = AppConfig::from_lookup(|key| match key {
            "LLM_PROVIDER" => Some("mock".to_string()),
            _ => None,
        })
        .unwrap();
        let model = build_language_model(&config).unwrap();
        assert_eq!(model.model(), "mock");
    }
}
