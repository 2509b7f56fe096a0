//! Load a stored file and split it into chunks

use std::path::Path;

use chrono::Utc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::chunker::RecursiveChunker;
use super::parser::FileParser;

/// Document identifier for a stored file: its path, exactly as used on disk
pub fn document_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Main ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    chunker: RecursiveChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: RecursiveChunker::new(chunk_size, chunk_overlap),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Parse raw bytes and chunk them under the given document identifier
    pub fn ingest(&self, document_id: &str, filename: &str, data: &[u8]) -> Result<(Document, Vec<Chunk>)> {
        let parsed = FileParser::parse(filename, data)?;
        let chunks = self.chunker.split(document_id, &parsed.pages);

        let doc = Document {
            id: document_id.to_string(),
            filename: filename.to_string(),
            file_type: parsed.file_type,
            content_hash: parsed.content_hash,
            size_bytes: data.len() as u64,
            total_pages: parsed.pages.len() as u32,
            loaded_at: Utc::now(),
        };

        tracing::info!(
            "Split {} ({}, {} pages) into {} chunks",
            doc.filename,
            doc.file_type.display_name(),
            doc.total_pages,
            chunks.len()
        );

        Ok((doc, chunks))
    }

    /// Read a stored file from disk, then parse and chunk it
    pub async fn load_and_split(&self, path: &Path) -> Result<(Document, Vec<Chunk>)> {
        let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::DocumentNotFound(document_id(path)),
            _ => Error::Io(e),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| document_id(path));

        tracing::info!("Loaded document {} ({} bytes)", filename, data.len());
        self.ingest(&document_id(path), &filename, &data)
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}
