//! Core types for the document Q&A service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, EmbeddedChunk, FileType, ScoredChunk};
pub use query::AskRequest;
pub use response::{AskResponse, UploadResponse};
