//! Per-conversation mutual exclusion.
//!
//! Messages for one conversation are processed one at a time, in the order
//! they acquire the lock; different conversations never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::ConversationId;

/// Prune idle entries once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 1024;

/// Keyed async locks, one per conversation id.
#[derive(Debug, Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`. Access ends when the guard drops.
    ///
    /// tokio's mutex is fair, so waiters are served in arrival order.
    pub async fn acquire(&self, id: &ConversationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.map();
            if locks.len() >= PRUNE_THRESHOLD {
                // Only the map holds an idle lock.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<ConversationId, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Channel, CustomerId};
    use std::time::Duration;

    fn id(customer: &str) -> ConversationId {
        ConversationId::new(CustomerId::new(customer).unwrap(), Channel::WhatsApp)
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(ConversationLocks::new());
        let guard = locks.acquire(&id("+1")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&id("+1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = ConversationLocks::new();
        let _a = locks.acquire(&id("+1")).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id("+2")))
            .await
            .expect("second key should not wait");
        assert_eq!(locks.tracked(), 2);
    }
}
