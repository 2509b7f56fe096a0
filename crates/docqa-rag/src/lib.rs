//! docqa-rag: Upload a document, then ask questions answered from its content
//!
//! Documents are split into bounded chunks, embedded once per document identifier and
//! cached in memory. A question is embedded with the same model, the most similar
//! chunks are placed into a fixed prompt template, and a language model writes the
//! answer. Embedding and generation run against a local Ollama server or an
//! OpenAI-compatible API, selected by configuration.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{Answer, RagPipeline};
pub use providers::{Backend, EmbeddingProvider, LlmProvider};
pub use retrieval::{DocumentIndex, IndexCache, IndexStore};
pub use types::{
    document::{Chunk, Document, FileType},
    query::AskRequest,
    response::{AskResponse, UploadResponse},
};
