//! Request pipeline: index (cached) → retrieve → assemble → generate

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{document_id, hash_content, IngestPipeline};
use crate::providers::Backend;
use crate::retrieval::{DocumentIndex, IndexStore, Retriever};
use crate::types::Chunk;

/// Generated answer and the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Retrieved chunks, most similar first
    pub chunks: Vec<Chunk>,
}

/// Orchestrates the RAG steps for one stored document at a time
pub struct RagPipeline {
    backend: Backend,
    store: Arc<dyn IndexStore>,
    ingest: IngestPipeline,
    retriever: Retriever,
}

impl RagPipeline {
    pub fn new(config: &RagConfig, backend: Backend, store: Arc<dyn IndexStore>) -> Self {
        let retriever = Retriever::new(backend.embedder.clone(), config.retrieval.top_k);
        Self {
            ingest: IngestPipeline::from_config(&config.chunking),
            backend,
            store,
            retriever,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn store(&self) -> &dyn IndexStore {
        self.store.as_ref()
    }

    /// Index for the file at `path`, embedding it only if no index is cached
    pub async fn index_file(&self, path: &Path) -> Result<Arc<DocumentIndex>> {
        let id = document_id(path);
        let build = async move {
            let (document, chunks) = self.ingest.load_and_split(path).await?;
            DocumentIndex::build(&document, chunks, self.backend.embedder.as_ref()).await
        }
        .boxed();

        self.store.get_or_build(&id, build).await
    }

    /// Drop the cached index for `path` if the file on disk no longer matches it.
    /// A build still in flight may have read the old bytes, so it is always dropped.
    /// Returns true if a cached or in-flight index was invalidated.
    pub async fn invalidate_if_changed(&self, path: &Path) -> Result<bool> {
        let id = document_id(path);
        // In-flight before cached: a build finishing between the two checks is still caught
        if self.store.is_building(&id) {
            tracing::info!("Index of {} is being built from replaced content; invalidating", id);
            self.store.invalidate(&id);
            return Ok(true);
        }

        let Some(cached) = self.store.get(&id) else {
            return Ok(false);
        };

        let data = tokio::fs::read(path).await?;
        if hash_content(&data) == cached.content_hash() {
            tracing::info!("Re-upload of {} has identical content; keeping index", id);
            return Ok(false);
        }

        tracing::info!("Content of {} changed; invalidating index", id);
        Ok(self.store.invalidate(&id))
    }

    /// Bring the index for a (re-)uploaded file up to date
    pub async fn refresh_file(&self, path: &Path) -> Result<Arc<DocumentIndex>> {
        self.invalidate_if_changed(path).await?;
        self.index_file(path).await
    }

    /// Answer `question` from the content of the file at `path`
    pub async fn ask(&self, path: &Path, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::bad_request("'question' must not be empty"));
        }

        let index = self.index_file(path).await?;
        let results = self.retriever.search(&index, question).await?;
        let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();

        let prompt = PromptBuilder::assemble(&chunks, question);
        tracing::debug!(
            "Prompt for {} uses {} chunks ({} chars)",
            index.document_id(),
            chunks.len(),
            prompt.len()
        );

        let text = self.backend.llm.generate(&prompt).await?;
        tracing::info!(
            "Answered question on {} with {} context chunks",
            index.document_id(),
            chunks.len()
        );

        Ok(Answer { text, chunks })
    }
}
