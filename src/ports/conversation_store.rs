//! Conversation store port - the Context Store.
//!
//! Single source of truth for conversation state visible to concurrent
//! requests. Every mutation is durable before the call returns.
//!
//! # Lifecycle
//!
//! - `load` opens an Active conversation when none exists for the key
//! - A Closed conversation stays in place (append → `NotFound`, status
//!   change → `InvalidTransition`) until the next `load`, which archives it
//!   and opens a fresh one under a new session id
//! - `load` also closes and replaces a conversation that has been inactive
//!   longer than the store's TTL, so a late message never lands on a
//!   conversation the sweeper is about to close

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{
    Conversation, ConversationError, ConversationStatus, ConversationUpdate, Turn,
};
use crate::domain::foundation::{ConversationId, Timestamp};

/// Errors from the conversation store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Unknown or closed conversation.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    /// Illegal status change.
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ConversationId,
        from: String,
        to: String,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<ConversationError> for StoreError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::Closed(id) => StoreError::NotFound(id),
            ConversationError::InvalidTransition { id, source } => StoreError::InvalidTransition {
                id,
                from: source.from,
                to: source.to,
            },
        }
    }
}

/// Port for conversation persistence.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the current conversation for `id`, opening a new Active one if
    /// there is none, the previous one is Closed, or it has expired by `now`.
    async fn load(&self, id: &ConversationId, now: Timestamp) -> Result<Conversation, StoreError>;

    /// Returns the current conversation without creating one.
    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Appends one turn.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation is absent or Closed
    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError>;

    /// Changes the status, enforcing the lifecycle transitions.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the conversation is absent
    /// - `InvalidTransition` for an illegal change (including any change out
    ///   of Closed, and Escalated without a ticket)
    async fn set_status(&self, id: &ConversationId, status: ConversationStatus)
        -> Result<(), StoreError>;

    /// Applies turns, language, ticket and status in one atomic step and
    /// returns the resulting conversation.
    async fn commit(
        &self,
        id: &ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation, StoreError>;

    /// Closes every open conversation inactive beyond the TTL as of `now`.
    /// Returns the ids it closed.
    async fn expire(&self, now: Timestamp) -> Result<Vec<ConversationId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Channel, CustomerId, TransitionError};

    fn id() -> ConversationId {
        ConversationId::new(CustomerId::new("+254700000000").unwrap(), Channel::WhatsApp)
    }

    #[test]
    fn closed_maps_to_not_found() {
        let err: StoreError = ConversationError::Closed(id()).into();
        assert_eq!(err, StoreError::NotFound(id()));
    }

    #[test]
    fn transition_error_keeps_states() {
        let err: StoreError = ConversationError::InvalidTransition {
            id: id(),
            source: TransitionError {
                from: "Closed".into(),
                to: "Active".into(),
            },
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid transition for whatsapp:+254700000000: Closed -> Active"
        );
    }
}
