//! Sentiment scorer port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{SentimentScore, Turn};
use crate::domain::foundation::ConversationId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SentimentError {
    #[error("sentiment scoring unavailable: {0}")]
    ScoringUnavailable(String),
}

/// Scores a customer message given the recent turns before it.
///
/// Results need not be deterministic, but must be within `[-1.0, 1.0]`.
/// `conversation_id` is for tracing only; it must not affect the score.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        recent_turns: &[Turn],
    ) -> Result<SentimentScore, SentimentError>;
}
