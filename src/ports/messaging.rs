//! Messaging transport port - outbound delivery to customers and operators.
//!
//! Failures here are logged by callers and never roll back conversation
//! state. Delivery is at-least-once upstream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::{Channel, CustomerId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessagingError {
    #[error("messaging transport unavailable: {0}")]
    Unavailable(String),

    #[error("messaging request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("messaging authentication failed")]
    AuthenticationFailed,
}

/// Acknowledgement returned by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAck {
    /// Provider-side message or ticket id, when the provider returns one.
    pub reference: Option<String>,
}

#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Sends a reply to the customer on their channel.
    async fn send_reply(
        &self,
        customer: &CustomerId,
        channel: Channel,
        text: &str,
    ) -> Result<DeliveryAck, MessagingError>;

    /// Puts an escalation ticket in front of the human queue.
    async fn notify_human(&self, ticket: &EscalationTicket) -> Result<DeliveryAck, MessagingError>;
}
