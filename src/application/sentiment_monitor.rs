//! Sentiment Monitor - bounded, failure-absorbing wrapper over a scorer.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::conversation::{SentimentScore, Turn};
use crate::domain::foundation::ConversationId;
use crate::ports::SentimentScorer;

pub struct SentimentMonitor {
    scorer: Arc<dyn SentimentScorer>,
    timeout: Duration,
}

impl SentimentMonitor {
    pub fn new(scorer: Arc<dyn SentimentScorer>, timeout: Duration) -> Self {
        Self { scorer, timeout }
    }

    /// Scores `text`. `None` means scoring was unavailable or timed out; the
    /// turn is then stored unscored and counts as neutral.
    pub async fn score(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        recent_turns: &[Turn],
    ) -> Option<SentimentScore> {
        match tokio::time::timeout(
            self.timeout,
            self.scorer.score(conversation_id, text, recent_turns),
        )
        .await
        {
            Ok(Ok(score)) => Some(score),
            Ok(Err(err)) => {
                tracing::warn!(%conversation_id, error = %err, "sentiment scoring failed, treating as neutral");
                None
            }
            Err(_) => {
                tracing::warn!(
                    %conversation_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "sentiment scoring timed out, treating as neutral"
                );
                None
            }
        }
    }
}
