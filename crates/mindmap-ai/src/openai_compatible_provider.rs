use crate::llm_provider::*;
use async_trait::async_trait;
use mindmap_core::{MindMapError, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for providers speaking the Chat Completions wire format (DeepSeek, OpenAI, ...)
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., "https://api.deepseek.com/v1")
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer key; some self-hosted endpoints accept none
    pub api_key: Option<SecretString>,
    /// Provider name for logs and error messages
    pub provider_name: String,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 120,
            api_key: None,
            provider_name: "deepseek".to_string(),
        }
    }
}

impl OpenAiCompatibleConfig {
    /// DeepSeek's hosted endpoint
    pub fn deepseek(api_key: SecretString) -> Self {
        Self {
            api_key: Some(api_key),
            ..Default::default()
        }
    }

    /// Create config for custom endpoint
    pub fn custom(base_url: String, model: String, provider_name: String) -> Self {
        Self {
            base_url,
            model,
            provider_name,
            ..Default::default()
        }
    }
}

/// Chat Completions client
pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MindMapError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_chat_completions(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let request = ChatCompletionsRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessageOut {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let mut request_builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.config.api_key {
            request_builder = request_builder
                .header("Authorization", format!("Bearer {}", api_key.expose_secret()));
        }

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                MindMapError::ProviderUnavailable(format!(
                    "{} request timed out after {}s",
                    self.config.provider_name, self.config.timeout_secs
                ))
            } else {
                MindMapError::ProviderUnavailable(format!(
                    "failed to reach {} at {}: {}",
                    self.config.provider_name, self.config.base_url, e
                ))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            MindMapError::ProviderUnavailable(format!(
                "failed to read {} response body: {}",
                self.config.provider_name, e
            ))
        })?;

        if !status.is_success() {
            return Err(MindMapError::ProviderUnavailable(format!(
                "{} API error ({}): {}",
                self.config.provider_name,
                status,
                if body.is_empty() { "no body" } else { body.as_str() }
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            MindMapError::MalformedModelOutput(format!(
                "{} completion body could not be parsed: {}",
                self.config.provider_name, e
            ))
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmResponse> {
        let response = self.send_chat_completions(messages, config).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MindMapError::MalformedModelOutput("no choices in completion".into()))?;
        let content = choice.message.content.ok_or_else(|| {
            MindMapError::MalformedModelOutput("first choice has no message content".into())
        })?;

        Ok(LlmResponse {
            content,
            total_tokens: response.usage.map(|u| u.total_tokens),
            finish_reason: choice.finish_reason,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// API request/response types for Chat Completions API

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageOut<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessageOut<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageIn,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageIn {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: usize,
}
