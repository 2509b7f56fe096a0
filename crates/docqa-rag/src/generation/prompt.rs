//! Prompt template for RAG generation

use crate::types::Chunk;

/// Fixed RAG template: instruction line, retrieved context, separator, question
pub const RAG_PROMPT_TEMPLATE: &str = "\
Answer the question based only on the document excerpts provided below and show examples where they help:
{context}
---
Answer the question and help the user find a solution based on the document provided: {question}";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join chunk texts in retrieval order, separated by a single space
    pub fn build_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render the full prompt for a question over retrieved chunks
    pub fn assemble(chunks: &[Chunk], question: &str) -> String {
        Self::render(&Self::build_context(chunks), question)
    }

    /// Fill the template. Placeholders are substituted in one pass so text inside the
    /// context is never re-interpreted as a placeholder.
    pub fn render(context: &str, question: &str) -> String {
        let mut prompt = String::with_capacity(RAG_PROMPT_TEMPLATE.len() + context.len() + question.len());
        let mut rest = RAG_PROMPT_TEMPLATE;

        while let Some(start) = rest.find('{') {
            prompt.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{context}") {
                prompt.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{question}") {
                prompt.push_str(question);
                rest = after;
            } else {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
        prompt.push_str(rest);
        prompt
    }
}
