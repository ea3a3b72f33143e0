//! Conversation aggregate entity.
//!
//! A conversation is the ordered history of exchanges with one customer on
//! one channel.
//!
//! # Aggregate Boundary
//!
//! Conversation is an aggregate root that owns its turns, its sentiment trend
//! and at most one escalation ticket.
//! - Turns are appended only through [`Conversation::append`]
//! - The sentiment trend grows only when a scored customer turn is appended
//! - `Escalated` is reachable only through [`Conversation::escalate`], which
//!   requires a ticket produced by the escalation policy

use serde::{Deserialize, Serialize};

use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::{ConversationId, SessionId, StateMachine, Timestamp};
use crate::domain::routing::TaskCategory;

use super::errors::ConversationError;
use super::{ConversationStatus, SentimentScore, SentimentTrend, Turn};

/// Conversation aggregate.
///
/// # Invariants
///
/// - Turn order equals append order
/// - `sentiment_trend.len()` equals the number of customer turns with a score
/// - Status follows [`ConversationStatus`] transitions; nothing leaves `Closed`
/// - `ticket` is present exactly when the conversation has been escalated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    session_id: SessionId,
    status: ConversationStatus,
    turns: Vec<Turn>,
    sentiment_trend: SentimentTrend,
    language: String,
    /// Category the conversation is currently about. Complaint is sticky until
    /// a resolution marker.
    category: Option<TaskCategory>,
    ticket: Option<EscalationTicket>,
    created_at: Timestamp,
    last_activity_at: Timestamp,
}

impl Conversation {
    /// Opens a new, empty Active conversation.
    pub fn open(id: ConversationId, language: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            session_id: SessionId::new(),
            status: ConversationStatus::Active,
            turns: Vec::new(),
            sentiment_trend: SentimentTrend::new(),
            language: language.into(),
            category: None,
            ticket: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Reconstitutes a conversation from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ConversationId,
        session_id: SessionId,
        status: ConversationStatus,
        turns: Vec<Turn>,
        sentiment_trend: SentimentTrend,
        language: String,
        category: Option<TaskCategory>,
        ticket: Option<EscalationTicket>,
        created_at: Timestamp,
        last_activity_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session_id,
            status,
            turns,
            sentiment_trend,
            language,
            category,
            ticket,
            created_at,
            last_activity_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    /// All turns in append order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn sentiment_trend(&self) -> &SentimentTrend {
        &self.sentiment_trend
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn category(&self) -> Option<TaskCategory> {
        self.category
    }

    pub fn ticket(&self) -> Option<&EscalationTicket> {
        self.ticket.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn last_activity_at(&self) -> &Timestamp {
        &self.last_activity_at
    }

    pub fn is_closed(&self) -> bool {
        self.status == ConversationStatus::Closed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recent `n` turns in order.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn latest_customer_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_customer())
    }

    /// Sentiment of the last `n` customer turns, newest last.
    ///
    /// Turns that could not be scored count as neutral.
    pub fn recent_customer_sentiment(&self, n: usize) -> Vec<SentimentScore> {
        let mut scores: Vec<SentimentScore> = self
            .turns
            .iter()
            .rev()
            .filter(|t| t.is_customer())
            .take(n)
            .map(|t| t.sentiment().unwrap_or_default())
            .collect();
        scores.reverse();
        scores
    }

    /// Customer turns since the last resolution marker.
    pub fn unresolved_customer_turns(&self) -> usize {
        self.turns
            .iter()
            .rev()
            .take_while(|t| !t.is_resolution_marker())
            .filter(|t| t.is_customer())
            .count()
    }

    /// True when nothing happened at or after `cutoff`.
    pub fn is_inactive_since(&self, cutoff: &Timestamp) -> bool {
        self.last_activity_at.is_before(cutoff)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a turn. Fails once the conversation is closed.
    pub fn append(&mut self, turn: Turn) -> Result<(), ConversationError> {
        if self.is_closed() {
            return Err(ConversationError::Closed(self.id.clone()));
        }

        if turn.is_customer() {
            if let Some(score) = turn.sentiment() {
                self.sentiment_trend.push(score);
            }
            if let Some(category) = turn.category() {
                if self.category != Some(TaskCategory::Complaint) {
                    self.category = Some(category);
                }
            }
        }
        if turn.is_resolution_marker() {
            self.category = None;
        }
        if turn.timestamp().is_after(&self.last_activity_at) {
            self.last_activity_at = *turn.timestamp();
        }

        self.turns.push(turn);
        Ok(())
    }

    /// Records activity at `at` without adding a turn. Earlier times are
    /// ignored.
    pub fn touch(&mut self, at: Timestamp) {
        if at.is_after(&self.last_activity_at) {
            self.last_activity_at = at;
        }
    }

    /// Sets a new language for subsequent agent replies.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Hands the conversation to a human.
    pub fn escalate(&mut self, ticket: EscalationTicket) -> Result<(), ConversationError> {
        self.transition(ConversationStatus::Escalated)?;
        self.ticket = Some(ticket);
        Ok(())
    }

    /// Closes the conversation.
    pub fn close(&mut self) -> Result<(), ConversationError> {
        self.transition(ConversationStatus::Closed)
    }

    /// Applies a validated status change. `Escalated` requires a ticket and
    /// must go through [`Conversation::escalate`].
    pub fn apply_status(&mut self, status: ConversationStatus) -> Result<(), ConversationError> {
        if status == ConversationStatus::Escalated && self.ticket.is_none() {
            return Err(ConversationError::InvalidTransition {
                id: self.id.clone(),
                source: crate::domain::foundation::TransitionError {
                    from: format!("{:?}", self.status),
                    to: "Escalated (without ticket)".to_string(),
                },
            });
        }
        self.transition(status)
    }

    fn transition(&mut self, target: ConversationStatus) -> Result<(), ConversationError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|source| ConversationError::InvalidTransition {
                id: self.id.clone(),
                source,
            })?;
        Ok(())
    }
}
