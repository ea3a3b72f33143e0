//! HTTP vector store client.
//!
//! Talks to an external similarity-search service:
//!
//! ```text
//! POST {base_url}/query   {"query": "...", "top_k": 3}
//! 200                     {"results": [{"source_id": "...", "text": "...", "score": 0.82}]}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::knowledge::KnowledgeSnippet;
use crate::ports::{KnowledgeError, KnowledgeStore};

#[derive(Debug, Clone)]
pub struct HttpVectorStoreConfig {
    pub base_url: String,
    api_key: Option<Secret<String>>,
    pub timeout: Duration,
}

impl HttpVectorStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(3),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Knowledge store backed by a remote vector index.
pub struct HttpVectorStore {
    config: HttpVectorStoreConfig,
    client: Client,
}

impl HttpVectorStore {
    pub fn new(config: HttpVectorStoreConfig) -> Result<Self, KnowledgeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                KnowledgeError::RetrievalUnavailable(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { config, client })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryHit>,
}

#[derive(Debug, Deserialize)]
struct QueryHit {
    source_id: String,
    text: String,
    score: f64,
}

impl QueryResponse {
    fn into_snippets(self, top_k: usize) -> Vec<KnowledgeSnippet> {
        let mut snippets: Vec<KnowledgeSnippet> = self
            .results
            .into_iter()
            .map(|hit| KnowledgeSnippet::new(hit.source_id, hit.text, hit.score))
            .collect();
        snippets.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        snippets.truncate(top_k);
        snippets
    }
}

#[async_trait]
impl KnowledgeStore for HttpVectorStore {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        let mut request = self
            .client
            .post(self.query_url())
            .json(&QueryRequest { query: text, top_k });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| KnowledgeError::RetrievalUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KnowledgeError::RetrievalUnavailable(format!(
                "vector store returned {}",
                status
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::RetrievalUnavailable(format!("bad response: {}", e)))?;

        Ok(body.into_snippets(top_k))
    }
}
