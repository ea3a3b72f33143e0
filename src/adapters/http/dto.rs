//! Data Transfer Objects for the inbound HTTP surface.

use serde::{Deserialize, Serialize};

use crate::application::{EscalationPayload, InboundMessage};
use crate::domain::conversation::{AgentKind, Conversation, ConversationStatus, Speaker, Turn};
use crate::domain::foundation::{Channel, CustomerId, SessionId, Timestamp, ValidationError};
use crate::domain::routing::TaskCategory;

/// Body LipaChat posts for each customer message.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundWebhook {
    pub customer_id: String,
    pub channel: Channel,
    pub text: String,
    /// Unix seconds; the receive time is used when absent.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub language: Option<String>,
}

impl InboundWebhook {
    pub fn into_message(self, received_at: Timestamp) -> Result<InboundMessage, ValidationError> {
        let customer = CustomerId::new(self.customer_id)?;
        let timestamp = match self.timestamp {
            Some(secs) => Timestamp::from_unix_secs(secs).ok_or_else(|| {
                ValidationError::invalid_format("timestamp", "not a valid unix time")
            })?,
            None => received_at,
        };

        let message = InboundMessage::new(customer, self.channel, self.text, timestamp)
            .with_received_at(received_at);
        Ok(match self.language {
            Some(language) if !language.trim().is_empty() => {
                message.with_language(language.trim().to_lowercase())
            }
            _ => message,
        })
    }
}

/// Read model returned by `GET /conversations/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub conversation_id: String,
    pub session_id: SessionId,
    pub status: ConversationStatus,
    pub language: String,
    pub category: Option<TaskCategory>,
    pub sentiment_trend: Vec<f64>,
    pub ticket: Option<EscalationPayload>,
    pub turns: Vec<TurnView>,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
}

impl From<&Conversation> for ConversationView {
    fn from(conversation: &Conversation) -> Self {
        Self {
            conversation_id: conversation.id().to_string(),
            session_id: *conversation.session_id(),
            status: conversation.status(),
            language: conversation.language().to_string(),
            category: conversation.category(),
            sentiment_trend: conversation
                .sentiment_trend()
                .scores()
                .iter()
                .map(|s| s.value())
                .collect(),
            ticket: conversation.ticket().map(EscalationPayload::from),
            turns: conversation.turns().iter().map(TurnView::from).collect(),
            created_at: *conversation.created_at(),
            last_activity_at: *conversation.last_activity_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            speaker: turn.speaker(),
            text: turn.text().to_string(),
            timestamp: *turn.timestamp(),
            agent: turn.agent_kind(),
            sentiment: turn.sentiment().map(|s| s.value()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
