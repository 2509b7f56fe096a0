//! Document loading and chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::RecursiveChunker;
pub use parser::{hash_content, FileParser, PageContent, ParsedDocument};
pub use processor::{document_id, IngestPipeline};
