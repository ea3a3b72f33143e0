//! In-Memory Conversation Store Adapter
//!
//! Keeps conversations in process memory. Used for tests, local development
//! and deployments without a database URL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, ConversationStatus, ConversationUpdate, Turn};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{ConversationStore, StoreError};

#[derive(Debug, Default)]
struct Slots {
    current: HashMap<ConversationId, Conversation>,
    archived: Vec<Conversation>,
}

/// In-memory conversation store.
#[derive(Debug, Clone)]
pub struct InMemoryConversationStore {
    slots: Arc<RwLock<Slots>>,
    ttl: Duration,
    default_language: String,
}

impl InMemoryConversationStore {
    /// Create a store with a 24h inactivity TTL and English as the default
    /// language.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots::default())),
            ttl: Duration::from_secs(86_400),
            default_language: "en".to_string(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Number of live (non-archived) conversations.
    pub async fn conversation_count(&self) -> usize {
        self.slots.read().await.current.len()
    }

    /// Previously closed conversations replaced by a newer session.
    pub async fn archived(&self) -> Vec<Conversation> {
        self.slots.read().await.archived.clone()
    }

    fn cutoff(&self, now: &Timestamp) -> Timestamp {
        now.minus_secs(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX))
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, id: &ConversationId, now: Timestamp) -> Result<Conversation, StoreError> {
        let cutoff = self.cutoff(&now);
        let mut slots = self.slots.write().await;

        if let Some(existing) = slots.current.get_mut(id) {
            if !existing.is_closed() && existing.is_inactive_since(&cutoff) {
                existing.close()?;
                tracing::info!(conversation_id = %id, "closed expired conversation on load");
            }
            if !existing.is_closed() {
                return Ok(existing.clone());
            }
        }

        if let Some(closed) = slots.current.remove(id) {
            slots.archived.push(closed);
        }

        let fresh = Conversation::open(id.clone(), self.default_language.clone(), now);
        slots.current.insert(id.clone(), fresh.clone());
        tracing::debug!(conversation_id = %id, session_id = %fresh.session_id(), "opened conversation");
        Ok(fresh)
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.slots.read().await.current.get(id).cloned())
    }

    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError> {
        let mut slots = self.slots.write().await;
        let conversation = slots
            .current
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        conversation.append(turn)?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        let mut slots = self.slots.write().await;
        let conversation = slots
            .current
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        conversation.apply_status(status)?;
        Ok(())
    }

    async fn commit(
        &self,
        id: &ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation, StoreError> {
        let mut slots = self.slots.write().await;
        let current = slots
            .current
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let next = update.applied_to(current)?;
        slots.current.insert(id.clone(), next.clone());
        Ok(next)
    }

    async fn expire(&self, now: Timestamp) -> Result<Vec<ConversationId>, StoreError> {
        let cutoff = self.cutoff(&now);
        let mut slots = self.slots.write().await;

        let mut closed = Vec::new();
        for conversation in slots.current.values_mut() {
            if !conversation.is_closed() && conversation.is_inactive_since(&cutoff) {
                conversation.close()?;
                closed.push(conversation.id().clone());
            }
        }
        closed.sort();
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::{EscalationReason, EscalationTicket};
    use crate::domain::foundation::{Channel, CustomerId};
    use crate::domain::routing::TaskCategory;
    use proptest::prelude::*;

    fn id(customer: &str) -> ConversationId {
        ConversationId::new(CustomerId::new(customer).unwrap(), Channel::WhatsApp)
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn customer_turn(text: &str, ts: Timestamp) -> Turn {
        Turn::customer(text, ts, None, TaskCategory::SupportQuery)
    }

    #[tokio::test]
    async fn load_creates_active_conversation_once() {
        let store = InMemoryConversationStore::new();
        let first = store.load(&id("+1"), at(1_000)).await.unwrap();
        let second = store.load(&id("+1"), at(1_001)).await.unwrap();

        assert_eq!(first.status(), ConversationStatus::Active);
        assert_eq!(first.session_id(), second.session_id());
        assert_eq!(store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn find_does_not_create() {
        let store = InMemoryConversationStore::new();
        assert!(store.find(&id("+1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_to_missing_conversation_is_not_found() {
        let store = InMemoryConversationStore::new();
        let err = store
            .append(&id("+1"), customer_turn("hi", at(1)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id("+1")));
    }

    #[tokio::test]
    async fn closed_conversation_rejects_append_and_transitions() {
        let store = InMemoryConversationStore::new();
        store.load(&id("+1"), at(1_000)).await.unwrap();
        store.set_status(&id("+1"), ConversationStatus::Closed).await.unwrap();

        assert_eq!(
            store.append(&id("+1"), customer_turn("hi", at(1_001))).await,
            Err(StoreError::NotFound(id("+1")))
        );
        assert!(matches!(
            store.set_status(&id("+1"), ConversationStatus::Active).await,
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn load_after_close_archives_and_opens_new_session() {
        let store = InMemoryConversationStore::new();
        let first = store.load(&id("+1"), at(1_000)).await.unwrap();
        store.set_status(&id("+1"), ConversationStatus::Closed).await.unwrap();

        let second = store.load(&id("+1"), at(1_100)).await.unwrap();
        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(second.status(), ConversationStatus::Active);
        assert_eq!(store.archived().await.len(), 1);
    }

    #[tokio::test]
    async fn escalated_without_ticket_is_invalid() {
        let store = InMemoryConversationStore::new();
        store.load(&id("+1"), at(1_000)).await.unwrap();
        assert!(matches!(
            store.set_status(&id("+1"), ConversationStatus::Escalated).await,
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = InMemoryConversationStore::new();
        let conversation = store.load(&id("+1"), at(1_000)).await.unwrap();
        let ticket = EscalationTicket::raise(&conversation, EscalationReason::CustomerRequest, at(1_001));

        let committed = store
            .commit(
                &id("+1"),
                ConversationUpdate::new()
                    .with_turn(customer_turn("human please", at(1_001)))
                    .with_ticket(ticket.clone()),
            )
            .await
            .unwrap();
        assert_eq!(committed.status(), ConversationStatus::Escalated);

        // A second ticket is an invalid transition; the turn must not land.
        let result = store
            .commit(
                &id("+1"),
                ConversationUpdate::new()
                    .with_turn(customer_turn("again", at(1_002)))
                    .with_ticket(ticket),
            )
            .await;
        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
        assert_eq!(store.find(&id("+1")).await.unwrap().unwrap().turn_count(), 1);
    }

    #[tokio::test]
    async fn expire_closes_inactive_conversations_only() {
        let store = InMemoryConversationStore::new().with_ttl(Duration::from_secs(100));
        store.load(&id("+1"), at(1_000)).await.unwrap();
        store.load(&id("+2"), at(1_000)).await.unwrap();
        store.append(&id("+2"), customer_turn("hi", at(1_150))).await.unwrap();

        let closed = store.expire(at(1_200)).await.unwrap();
        assert_eq!(closed, vec![id("+1")]);

        let again = store.expire(at(1_200)).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn load_replaces_expired_conversation() {
        let store = InMemoryConversationStore::new().with_ttl(Duration::from_secs(100));
        let first = store.load(&id("+1"), at(1_000)).await.unwrap();
        let second = store.load(&id("+1"), at(2_000)).await.unwrap();

        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(store.archived().await[0].status(), ConversationStatus::Closed);
    }

    #[tokio::test]
    async fn oversized_ttl_never_expires_a_fresh_conversation() {
        for secs in [u64::MAX, 10_000_000_000_000] {
            let store = InMemoryConversationStore::new().with_ttl(Duration::from_secs(secs));
            let first = store.load(&id("+1"), at(1_000)).await.unwrap();
            let second = store.load(&id("+1"), at(1_000)).await.unwrap();

            assert_eq!(first.session_id(), second.session_id());
            assert!(store.expire(at(1_000)).await.unwrap().is_empty());
            assert!(store.archived().await.is_empty());
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Append(u8),
        Status(ConversationStatus),
    }

    fn any_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Append),
            Just(Op::Status(ConversationStatus::Active)),
            Just(Op::Status(ConversationStatus::Escalated)),
            Just(Op::Status(ConversationStatus::Closed)),
        ]
    }

    proptest! {
        #[test]
        fn appends_keep_arrival_order_and_closed_is_final(ops in proptest::collection::vec(any_op(), 1..40)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemoryConversationStore::new();
                let key = id("+254700000099");
                store.load(&key, at(1_000)).await.unwrap();

                let mut expected = Vec::new();
                let mut closed = false;
                for (i, op) in ops.into_iter().enumerate() {
                    match op {
                        Op::Append(n) => {
                            let text = format!("{}-{}", i, n);
                            let result = store.append(&key, customer_turn(&text, at(1_000 + i as i64))).await;
                            if closed {
                                assert_eq!(result, Err(StoreError::NotFound(key.clone())));
                            } else {
                                assert!(result.is_ok());
                                expected.push(text);
                            }
                        }
                        Op::Status(status) => {
                            let result = store.set_status(&key, status).await;
                            if closed {
                                assert!(result.is_err());
                            }
                        }
                    }
                    let current = store.find(&key).await.unwrap().unwrap();
                    if closed {
                        assert_eq!(current.status(), ConversationStatus::Closed);
                    }
                    closed = current.is_closed();
                }

                let stored: Vec<String> = store
                    .find(&key)
                    .await
                    .unwrap()
                    .unwrap()
                    .turns()
                    .iter()
                    .map(|t| t.text().to_string())
                    .collect();
                assert_eq!(stored, expected);
            });
        }
    }
}
