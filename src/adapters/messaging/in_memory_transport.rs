//! In-memory messaging transport for tests and local runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::{Channel, CustomerId};
use crate::ports::{DeliveryAck, MessagingError, MessagingTransport};

/// Something the transport was asked to deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Reply {
        customer: CustomerId,
        channel: Channel,
        text: String,
    },
    Handoff(EscalationTicket),
}

/// Records deliveries instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessagingTransport {
    deliveries: Arc<RwLock<Vec<Delivery>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryMessagingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails with `Unavailable` and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.read().await.clone()
    }

    /// Reply texts sent to `customer`, oldest first.
    pub async fn replies_to(&self, customer: &CustomerId) -> Vec<String> {
        self.deliveries
            .read()
            .await
            .iter()
            .filter_map(|d| match d {
                Delivery::Reply { customer: c, text, .. } if c == customer => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn handoffs(&self) -> Vec<EscalationTicket> {
        self.deliveries
            .read()
            .await
            .iter()
            .filter_map(|d| match d {
                Delivery::Handoff(ticket) => Some(ticket.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, delivery: Delivery) -> Result<DeliveryAck, MessagingError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Unavailable("transport offline".to_string()));
        }
        let mut deliveries = self.deliveries.write().await;
        deliveries.push(delivery);
        Ok(DeliveryAck {
            reference: Some(format!("mem-{}", deliveries.len())),
        })
    }
}

#[async_trait]
impl MessagingTransport for InMemoryMessagingTransport {
    async fn send_reply(
        &self,
        customer: &CustomerId,
        channel: Channel,
        text: &str,
    ) -> Result<DeliveryAck, MessagingError> {
        self.record(Delivery::Reply {
            customer: customer.clone(),
            channel,
            text: text.to_string(),
        })
        .await
    }

    async fn notify_human(&self, ticket: &EscalationTicket) -> Result<DeliveryAck, MessagingError> {
        self.record(Delivery::Handoff(ticket.clone())).await
    }
}
