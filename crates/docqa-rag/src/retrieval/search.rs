//! Query-time retrieval over a document index

use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::types::ScoredChunk;

use super::index::DocumentIndex;

/// Embeds a question and returns the most similar chunks of one document
#[derive(Clone)]
pub struct Retriever {
    /// Must be the provider the index was built with
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Top chunks for `query`, most similar first
    pub async fn search(&self, index: &DocumentIndex, query: &str) -> Result<Vec<ScoredChunk>> {
        self.search_k(index, query, self.top_k).await
    }

    /// Like [`search`](Self::search) with an explicit `k`
    pub async fn search_k(
        &self,
        index: &DocumentIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        // Nothing to rank; skip the backend call
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.search(&query_embedding, k)?;

        tracing::debug!(
            "Retrieved {} of {} chunks for {} (best similarity {:.3})",
            results.len(),
            index.len(),
            index.document_id(),
            results.first().map_or(0.0, |r| r.similarity)
        );

        Ok(results)
    }
}
