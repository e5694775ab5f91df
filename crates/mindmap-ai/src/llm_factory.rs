use crate::llm_provider::*;
use crate::openai_compatible_provider::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use mindmap_core::{LlmConfig, MindMapError, Result};
use std::sync::Arc;

/// Factory for creating LLM providers based on configuration
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
        let provider_name = config.provider.to_lowercase();

        match provider_name.as_str() {
            "deepseek" | "openai" => Self::create_hosted_provider(config, provider_name),
            "openai-compatible" => Self::create_openai_compatible_provider(config),
            _ => Err(MindMapError::Config(format!(
                "Unsupported LLM provider: {}. Available providers: deepseek, openai, openai-compatible",
                provider_name
            ))),
        }
    }

    /// Hosted providers always need an API key
    fn create_hosted_provider(
        config: &LlmConfig,
        provider_name: String,
    ) -> Result<Arc<dyn LlmProvider>> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            MindMapError::Config(format!(
                "{} API key not found. Set 'llm.api_key' in config or DEEPSEEK_API_KEY",
                provider_name
            ))
        })?;

        let compat_config = OpenAiCompatibleConfig {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            api_key: Some(api_key),
            provider_name,
        };

        Ok(Arc::new(OpenAiCompatibleProvider::new(compat_config)?))
    }

    /// Self-hosted endpoints (LM Studio, Ollama, vLLM) where the key is optional
    fn create_openai_compatible_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
        let compat_config = OpenAiCompatibleConfig {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            api_key: config.api_key.clone(),
            provider_name: "openai-compatible".to_string(),
        };

        Ok(Arc::new(OpenAiCompatibleProvider::new(compat_config)?))
    }
}
