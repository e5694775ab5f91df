pub mod generator;
pub mod llm_factory;
pub mod llm_provider;
pub mod openai_compatible_provider;
pub mod prompt;

pub use generator::{parse_model_output, MindMapGenerator};
pub use llm_factory::LlmProviderFactory;
pub use llm_provider::*;
pub use openai_compatible_provider::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
