//! Model-backed sentiment scorer.
//!
//! Asks the language model for a single number. Anything that is not a
//! number in `[-1, 1]` counts as unavailable rather than being guessed at.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::conversation::{SentimentScore, Speaker, Turn};
use crate::domain::foundation::ConversationId;
use crate::ports::{
    AIProvider, CompletionRequest, Message, RequestMetadata, SentimentError, SentimentScorer,
};

const SYSTEM_PROMPT: &str = "You rate the sentiment of customer messages sent to LipaChat support. \
Reply with a single number between -1 (very negative) and 1 (very positive), and nothing else. \
Messages may be in English or Kiswahili.";

/// Sentiment scorer that delegates to an [`AIProvider`].
pub struct ModelSentimentScorer {
    provider: Arc<dyn AIProvider>,
    context_turns: usize,
}

impl ModelSentimentScorer {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            context_turns: 4,
        }
    }

    fn prompt(&self, text: &str, recent_turns: &[Turn]) -> String {
        let mut prompt = String::new();
        let start = recent_turns.len().saturating_sub(self.context_turns);
        let context: Vec<&Turn> = recent_turns[start..]
            .iter()
            .filter(|t| t.speaker() != Speaker::System)
            .collect();

        if !context.is_empty() {
            let _ = writeln!(prompt, "Recent conversation:");
            for turn in context {
                let _ = writeln!(prompt, "{}: {}", turn.speaker().as_str(), turn.text());
            }
            let _ = writeln!(prompt);
        }
        let _ = write!(prompt, "Message to rate: {}", text);
        prompt
    }
}

#[async_trait]
impl SentimentScorer for ModelSentimentScorer {
    async fn score(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        recent_turns: &[Turn],
    ) -> Result<SentimentScore, SentimentError> {
        let request = CompletionRequest::new(RequestMetadata::new(
            conversation_id.clone(),
            "sentiment",
            uuid::Uuid::new_v4().to_string(),
        ))
        .with_system_prompt(SYSTEM_PROMPT)
        .with_messages([Message::user(self.prompt(text, recent_turns))])
        .with_max_tokens(8)
        .with_temperature(0.0);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| SentimentError::ScoringUnavailable(e.to_string()))?;

        parse_score(&response.content)
    }
}

fn parse_score(reply: &str) -> Result<SentimentScore, SentimentError> {
    let token = reply
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| !c.is_ascii_digit());

    let value: f64 = token.parse().map_err(|_| {
        SentimentError::ScoringUnavailable(format!("unparseable score: {:?}", reply))
    })?;

    SentimentScore::new(value)
        .map_err(|_| SentimentError::ScoringUnavailable(format!("score out of range: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::foundation::{Channel, CustomerId, Timestamp};
    use crate::domain::routing::TaskCategory;
    use crate::ports::AIError;

    fn id() -> ConversationId {
        ConversationId::new(CustomerId::new("+254700000021").unwrap(), Channel::Sms)
    }

    #[test]
    fn parses_plain_and_punctuated_numbers() {
        assert_eq!(parse_score("-0.6").unwrap().value(), -0.6);
        assert_eq!(parse_score(" 0.25.\n").unwrap().value(), 0.25);
        assert_eq!(parse_score("1").unwrap().value(), 1.0);
    }

    #[test]
    fn rejects_out_of_range_and_prose() {
        assert!(parse_score("1.7").is_err());
        assert!(parse_score("negative").is_err());
        assert!(parse_score("").is_err());
    }

    #[tokio::test]
    async fn scores_via_provider_with_context() {
        let mock = Arc::new(MockAIProvider::new().with_response("-0.7"));
        let scorer = ModelSentimentScorer::new(mock.clone());
        let history = vec![Turn::customer(
            "my payment failed",
            Timestamp::now(),
            None,
            TaskCategory::Troubleshooting,
        )];

        let score = scorer.score(&id(), "still broken", &history).await.unwrap();
        assert_eq!(score.value(), -0.7);

        let calls = mock.get_calls();
        assert_eq!(calls[0].metadata.purpose, "sentiment");
        assert!(calls[0].messages[0].content.contains("customer: my payment failed"));
        assert!(calls[0].messages[0].content.contains("Message to rate: still broken"));
    }

    #[tokio::test]
    async fn provider_error_is_unavailable() {
        let mock = Arc::new(MockAIProvider::new().with_error(AIError::unavailable("down")));
        let scorer = ModelSentimentScorer::new(mock);
        assert!(matches!(
            scorer.score(&id(), "hello", &[]).await,
            Err(SentimentError::ScoringUnavailable(_))
        ));
    }
}
