//! Prompt assembly for answer generation

pub mod prompt;

pub use prompt::{PromptBuilder, RAG_PROMPT_TEMPLATE};
