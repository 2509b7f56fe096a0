//! Embedding index, index store, and retrieval

mod cache;
mod index;
mod search;

pub use cache::{CacheStats, IndexBuild, IndexCache, IndexStore};
pub use index::{cosine_similarity, DocumentIndex};
pub use search::Retriever;
