//! Application state for the Q&A server

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::pipeline::RagPipeline;
use crate::providers::Backend;
use crate::retrieval::{IndexCache, IndexStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Index, retrieve and generate
    pipeline: RagPipeline,
}

impl AppState {
    /// Create state with a fresh in-memory index cache
    pub fn new(config: RagConfig, backend: Backend) -> Self {
        let store = Arc::new(IndexCache::from_config(&config.cache));
        Self::with_store(config, backend, store)
    }

    /// Create state over an existing index store
    pub fn with_store(config: RagConfig, backend: Backend, store: Arc<dyn IndexStore>) -> Self {
        tracing::info!("Initializing application state ({})", backend.describe());
        let pipeline = RagPipeline::new(&config, backend, store);

        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the RAG pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Where an uploaded file with this (already sanitized) name is stored
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.inner.config.server.upload_dir.join(filename)
    }
}
