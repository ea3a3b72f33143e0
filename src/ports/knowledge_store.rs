//! Knowledge store port - vector search over support and product content.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::knowledge::KnowledgeSnippet;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnowledgeError {
    #[error("knowledge retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
}

/// Port for relevance-ranked passage lookup.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Returns at most `top_k` snippets, most relevant first.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError>;
}
