use std::sync::Arc;

use anyhow::Context;
use mindmap_ai::{LlmProviderFactory, MindMapGenerator};
use mindmap_client::{IdentityClient, MemorySessionStore};
use mindmap_core::Settings;

use crate::auth::IdentityVerifier;

/// Collaborators shared by every request; built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<MindMapGenerator>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(generator: Arc<MindMapGenerator>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            generator,
            identity,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = LlmProviderFactory::create_from_config(&settings.llm)
            .context("creating model provider")?;
        let generator = MindMapGenerator::new(provider);

        // Server-side lookups never persist a session.
        let identity =
            IdentityClient::from_config(&settings.identity, Arc::new(MemorySessionStore::new()))
                .context("creating identity client")?;

        Ok(Self::new(Arc::new(generator), Arc::new(identity)))
    }
}
