//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document, loaded page by page
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Any other file whose bytes are valid UTF-8
    Text,
}

impl FileType {
    /// Detect file type from a filename's extension
    pub fn from_filename(filename: &str) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Text,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Text => "Text",
        }
    }
}

/// An uploaded document, identified by its stored path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier (the stored file path, used as the cache key)
    pub id: String,
    /// Original filename
    pub filename: String,
    /// Detected file type
    pub file_type: FileType,
    /// Hex SHA-256 of the raw bytes
    pub content_hash: String,
    /// Raw size in bytes
    pub size_bytes: u64,
    /// Number of page units produced by the loader
    pub total_pages: u32,
    /// When the document was loaded
    pub loaded_at: DateTime<Utc>,
}

/// A contiguous slice of one page of document text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the source document
    pub document_id: String,
    /// Position within the document (0-based, document order)
    pub index: u32,
    /// Page the chunk was cut from (1-indexed)
    pub page_number: u32,
    /// Byte offset of the chunk within its page text
    pub byte_start: usize,
    /// Byte offset one past the chunk's end within its page text
    pub byte_end: usize,
    /// Chunk text, verbatim from the page
    pub content: String,
}

impl Chunk {
    /// Number of characters in the chunk
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A chunk together with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}
