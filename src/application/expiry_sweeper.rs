//! Background task that closes inactive conversations.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{ConversationStore, StoreError};

/// Periodically calls [`ConversationStore::expire`].
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn ConversationStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ConversationStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// One sweep at `now`.
    pub async fn sweep_once(&self, now: Timestamp) -> Result<Vec<ConversationId>, StoreError> {
        let closed = self.store.expire(now).await?;
        if !closed.is_empty() {
            tracing::info!(count = closed.len(), ids = ?closed, "closed inactive conversations");
        }
        Ok(closed)
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep_once(Timestamp::now()).await {
                            tracing::error!(error = %err, "expiry sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::debug!("expiry sweeper stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::foundation::{Channel, CustomerId};

    fn id(customer: &str) -> ConversationId {
        ConversationId::new(CustomerId::new(customer).unwrap(), Channel::WhatsApp)
    }

    #[tokio::test]
    async fn sweep_once_closes_stale_conversations() {
        let store = Arc::new(InMemoryConversationStore::new().with_ttl(Duration::from_secs(60)));
        let start = Timestamp::from_unix_secs(1_000).unwrap();
        store.load(&id("+1"), start).await.unwrap();

        let sweeper = ExpirySweeper::new(store.clone(), Duration::from_secs(1));
        assert!(sweeper.sweep_once(start.plus_secs(30)).await.unwrap().is_empty());
        assert_eq!(sweeper.sweep_once(start.plus_secs(61)).await.unwrap(), vec![id("+1")]);
    }

    #[tokio::test]
    async fn spawned_sweeper_closes_and_stops() {
        let store = Arc::new(InMemoryConversationStore::new().with_ttl(Duration::from_secs(60)));
        store
            .load(&id("+2"), Timestamp::now().minus_secs(3_600))
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = ExpirySweeper::new(store.clone(), Duration::from_millis(10)).spawn(rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let conversation = store.find(&id("+2")).await.unwrap().unwrap();
        assert!(conversation.is_closed());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
