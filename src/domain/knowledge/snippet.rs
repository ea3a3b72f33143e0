use serde::{Deserialize, Serialize};

/// A passage retrieved for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub source_id: String,
    pub text: String,
    /// Relevance in `[0.0, 1.0]`, higher is better.
    pub relevance: f64,
}

impl KnowledgeSnippet {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>, relevance: f64) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            relevance: if relevance.is_nan() {
                0.0
            } else {
                relevance.clamp(0.0, 1.0)
            },
        }
    }
}

/// Highest relevance in the set, `None` when empty.
pub fn best_relevance(snippets: &[KnowledgeSnippet]) -> Option<f64> {
    snippets.iter().map(|s| s.relevance).reduce(f64::max)
}
