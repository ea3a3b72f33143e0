//! Knowledge module - passages merged into agent prompts.

mod retriever;
mod snippet;

pub use retriever::{KnowledgeRetriever, RetrievalSettings};
pub use snippet::{best_relevance, KnowledgeSnippet};
