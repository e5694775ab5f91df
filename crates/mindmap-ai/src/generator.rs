use std::sync::Arc;

use mindmap_core::{Graph, GraphParseError, MindMapError, Result, ValidationError};
use tracing::{debug, info, warn};

use crate::llm_provider::{GenerationConfig, LlmProvider, Message};
use crate::prompt;

/// Turns a topic (and optional feedback) into a validated [`Graph`] by prompting a model.
pub struct MindMapGenerator {
    provider: Arc<dyn LlmProvider>,
    config: GenerationConfig,
}

impl MindMapGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            config: GenerationConfig::default(),
        }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub async fn generate(&self, topic: &str) -> Result<Graph> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::TopicRequired.into());
        }

        info!(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "generating mind map"
        );
        self.complete(&prompt::generate_messages(topic)).await
    }

    pub async fn refine(&self, topic: &str, feedback: &str) -> Result<Graph> {
        let (topic, feedback) = (topic.trim(), feedback.trim());
        if topic.is_empty() || feedback.is_empty() {
            return Err(ValidationError::FieldsRequired.into());
        }

        info!(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "refining mind map"
        );
        self.complete(&prompt::refine_messages(topic, feedback)).await
    }

    async fn complete(&self, messages: &[Message]) -> Result<Graph> {
        let response = self
            .provider
            .generate_chat(messages, &self.config)
            .await
            .inspect_err(|e| warn!(error = %e, "model call failed"))?;

        debug!(
            content_len = response.content.len(),
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            total_tokens = response.total_tokens,
            "model call finished"
        );

        parse_model_output(&response.content)
            .inspect(|graph| {
                info!(
                    nodes = graph.nodes().len(),
                    edges = graph.edges().len(),
                    "mind map validated"
                )
            })
            .inspect_err(|e| warn!(error = %e, "model output rejected"))
    }
}

/// Parses completion text as a graph; anything short of a fully valid graph is
/// `MalformedModelOutput`.
pub fn parse_model_output(content: &str) -> Result<Graph> {
    Graph::from_json_str(content).map_err(|e| match e {
        GraphParseError::Json(err) => {
            MindMapError::MalformedModelOutput(format!("content is not valid JSON: {err}"))
        }
        GraphParseError::Invalid(err) => MindMapError::MalformedModelOutput(err.to_string()),
    })
}
