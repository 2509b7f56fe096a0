//! Per-document embedding index with cosine similarity search

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document, EmbeddedChunk, ScoredChunk};

/// Embedded chunks of one document
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    document_id: String,
    content_hash: String,
    chunks: Vec<EmbeddedChunk>,
    /// Vector dimension; 0 for an empty index
    dimensions: usize,
    built_at: DateTime<Utc>,
}

impl DocumentIndex {
    /// Pair chunks with their embeddings. All vectors must share one dimension.
    pub fn new(
        document_id: impl Into<String>,
        content_hash: impl Into<String>,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(Error::embedding(format!(
                "Backend returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(Error::embedding(format!(
                "Embedding {} has dimension {}, expected {}",
                bad,
                embeddings[bad].len(),
                dimensions
            )));
        }

        Ok(Self {
            document_id: document_id.into(),
            content_hash: content_hash.into(),
            chunks: chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
                .collect(),
            dimensions,
            built_at: Utc::now(),
        })
    }

    /// Embed every chunk of a document with one batch call.
    ///
    /// An empty chunk list yields an empty index without touching the backend.
    pub async fn build(
        document: &Document,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        if chunks.is_empty() {
            tracing::info!("Document {} has no text; built empty index", document.id);
            return Self::new(&document.id, &document.content_hash, Vec::new(), Vec::new());
        }

        tracing::info!(
            "Indexing vectors for {} ({} chunks, model {})",
            document.id,
            chunks.len(),
            embedder.model()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        Self::new(&document.id, &document.content_hash, chunks, embeddings)
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Hex SHA-256 of the file the index was built from
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        &self.chunks
    }

    /// Top `k` chunks by descending cosine similarity; ties keep document order.
    ///
    /// Returns `min(k, len)` results. A query vector from a different embedding
    /// space (dimension mismatch) is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Query embedding has dimension {}, index for {} has {}",
                query.len(),
                self.document_id,
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|ec| ScoredChunk {
                chunk: ec.chunk.clone(),
                similarity: cosine_similarity(&ec.embedding, query),
            })
            .collect();

        // sort_by is stable, so equal scores stay in chunk order
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Cosine similarity; 0.0 if either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: u32, content: &str) -> Chunk {
        Chunk {
            document_id: "doc".into(),
            index,
            page_number: 1,
            byte_start: 0,
            byte_end: content.len(),
            content: content.into(),
        }
    }

    fn index(vectors: Vec<Vec<f32>>) -> DocumentIndex {
        let chunks = (0..vectors.len() as u32)
            .map(|i| chunk(i, &format!("chunk {}", i)))
            .collect();
        DocumentIndex::new("doc", "hash", chunks, vectors).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let idx = index(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]]);
        let results = idx.search(&[1.0, 0.0], 4).unwrap();

        let order: Vec<u32> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_search_respects_k() {
        let idx = index(vec![vec![1.0, 0.0]; 10]);
        assert_eq!(idx.search(&[1.0, 0.0], 4).unwrap().len(), 4);
        assert_eq!(idx.search(&[1.0, 0.0], 20).unwrap().len(), 10);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let idx = index(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]);
        let order: Vec<u32> = idx
            .search(&[1.0, 0.0], 3)
            .unwrap()
            .iter()
            .map(|r| r.chunk.index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_index_search_is_empty() {
        let idx = DocumentIndex::new("doc", "hash", Vec::new(), Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.search(&[1.0, 2.0, 3.0], 4).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let idx = index(vec![vec![1.0, 0.0]]);
        assert!(matches!(idx.search(&[1.0, 0.0, 0.0], 4), Err(Error::Embedding(_))));

        let err = DocumentIndex::new(
            "doc",
            "hash",
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_embedding_count_mismatch_rejected() {
        let err = DocumentIndex::new("doc", "hash", vec![chunk(0, "a")], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }
}
