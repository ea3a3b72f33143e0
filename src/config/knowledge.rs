//! Knowledge retrieval configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::knowledge::RetrievalSettings;

/// Knowledge store selection and retrieval limits.
///
/// Without `vector_store_url` the bundled in-memory knowledge base is used.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    pub vector_store_url: Option<String>,
    pub vector_store_api_key: Option<String>,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl KnowledgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn vector_store(&self) -> Option<&str> {
        self.vector_store_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn retrieval_settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            top_k: self.top_k,
            min_relevance: self.min_relevance,
            timeout: self.timeout(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.vector_store() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl("knowledge.vector_store_url"));
            }
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(ValidationError::OutOfRange {
                field: "knowledge.min_relevance",
                reason: "must be within [0, 1]",
            });
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            vector_store_url: None,
            vector_store_api_key: None,
            top_k: default_top_k(),
            min_relevance: default_min_relevance(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_min_relevance() -> f64 {
    0.1
}

fn default_timeout_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retrieval_defaults() {
        let config = KnowledgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval_settings(), RetrievalSettings::default());
        assert!(config.vector_store().is_none());
    }

    #[test]
    fn test_blank_url_means_in_memory() {
        let config = KnowledgeConfig {
            vector_store_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.vector_store().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = KnowledgeConfig {
            vector_store_url: Some("kb.internal".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = KnowledgeConfig {
            min_relevance: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
