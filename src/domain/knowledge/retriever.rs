//! Knowledge Retriever - fetches passages for a query from the knowledge store.
//!
//! Retrieval is best-effort: a failing or slow store yields an empty set and
//! the conversation carries on.

use std::sync::Arc;
use std::time::Duration;

use crate::ports::{KnowledgeError, KnowledgeStore};

use super::KnowledgeSnippet;

/// Retrieval limits.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Snippets below this relevance are dropped.
    pub min_relevance: f64,
    pub timeout: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_relevance: 0.1,
            timeout: Duration::from_secs(3),
        }
    }
}

/// Wraps a [`KnowledgeStore`] with limits, a timeout and failure absorption.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    store: Arc<dyn KnowledgeStore>,
    settings: RetrievalSettings,
}

impl KnowledgeRetriever {
    pub fn new(store: Arc<dyn KnowledgeStore>, settings: RetrievalSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Queries the store, mapping a timeout to `RetrievalUnavailable`.
    pub async fn try_retrieve(&self, query: &str) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        if query.trim().is_empty() || self.settings.top_k == 0 {
            return Ok(Vec::new());
        }

        let found = tokio::time::timeout(
            self.settings.timeout,
            self.store.query(query, self.settings.top_k),
        )
        .await
        .map_err(|_| {
            KnowledgeError::RetrievalUnavailable(format!(
                "timed out after {}ms",
                self.settings.timeout.as_millis()
            ))
        })??;

        let mut snippets: Vec<KnowledgeSnippet> = found
            .into_iter()
            .filter(|s| s.relevance >= self.settings.min_relevance)
            .collect();
        snippets.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        snippets.truncate(self.settings.top_k);
        Ok(snippets)
    }

    /// Like [`try_retrieve`](Self::try_retrieve) but degrades to an empty set.
    pub async fn retrieve(&self, query: &str) -> Vec<KnowledgeSnippet> {
        match self.try_retrieve(query).await {
            Ok(snippets) => {
                tracing::debug!(count = snippets.len(), "knowledge retrieved");
                snippets
            }
            Err(err) => {
                tracing::warn!(error = %err, "knowledge retrieval failed, continuing without it");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedStore(Vec<KnowledgeSnippet>);

    #[async_trait]
    impl KnowledgeStore for FixedStore {
        async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl KnowledgeStore for FailingStore {
        async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
            Err(KnowledgeError::RetrievalUnavailable("index offline".into()))
        }
    }

    struct SlowStore;

    #[async_trait]
    impl KnowledgeStore for SlowStore {
        async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![KnowledgeSnippet::new("late", "too late", 1.0)])
        }
    }

    #[tokio::test]
    async fn filters_sorts_and_truncates() {
        let store = FixedStore(vec![
            KnowledgeSnippet::new("low", "t", 0.05),
            KnowledgeSnippet::new("mid", "t", 0.5),
            KnowledgeSnippet::new("high", "t", 0.9),
            KnowledgeSnippet::new("mid2", "t", 0.4),
        ]);
        let retriever = KnowledgeRetriever::new(
            Arc::new(store),
            RetrievalSettings {
                top_k: 2,
                ..RetrievalSettings::default()
            },
        );

        let ids: Vec<_> = retriever
            .retrieve("payment")
            .await
            .into_iter()
            .map(|s| s.source_id)
            .collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }

    #[tokio::test]
    async fn failure_degrades_to_empty() {
        let retriever = KnowledgeRetriever::new(Arc::new(FailingStore), RetrievalSettings::default());
        assert!(retriever.try_retrieve("payment").await.is_err());
        assert!(retriever.retrieve("payment").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_degrades_to_empty() {
        let retriever = KnowledgeRetriever::new(Arc::new(SlowStore), RetrievalSettings::default());
        assert!(retriever.retrieve("payment").await.is_empty());
    }

    #[tokio::test]
    async fn blank_query_skips_store() {
        let retriever = KnowledgeRetriever::new(Arc::new(FailingStore), RetrievalSettings::default());
        assert_eq!(retriever.try_retrieve("   ").await, Ok(Vec::new()));
    }
}
