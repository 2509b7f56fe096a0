//! Model backends for embeddings and generation
//!
//! A [`Backend`] pairs one embedding provider with one LLM provider. Which pair is
//! used (local Ollama or a remote OpenAI-compatible API) is chosen from configuration
//! at start-up.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use crate::config::{BackendProvider, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;

/// Embedding and generation capabilities of one configured backend
#[derive(Clone)]
pub struct Backend {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

impl Backend {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { embedder, llm }
    }

    /// Build the backend selected by `config.backend.provider`
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        match config.backend.provider {
            BackendProvider::Ollama => {
                let (embedder, llm) = ollama::ollama_providers(&config.ollama)?;
                Ok(Self::new(Arc::new(embedder), Arc::new(llm)))
            }
            BackendProvider::OpenAi => {
                let (embedder, llm) = openai::openai_providers(&config.openai)?;
                Ok(Self::new(Arc::new(embedder), Arc::new(llm)))
            }
        }
    }

    /// True only if both providers answer their health checks
    pub async fn health_check(&self) -> bool {
        let embedder_ok = self.embedder.health_check().await.unwrap_or(false);
        let llm_ok = self.llm.health_check().await.unwrap_or(false);
        embedder_ok && llm_ok
    }

    /// Short description for logs, e.g. `ollama (embed: nomic-embed-text, generate: llama3.2)`
    pub fn describe(&self) -> String {
        format!(
            "{} (embed: {}, generate: {})",
            self.llm.name(),
            self.embedder.model(),
            self.llm.model()
        )
    }
}
