use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::{Conversation, SentimentScore};
use crate::domain::foundation::{ConversationId, SessionId, TicketId, Timestamp};
use crate::domain::routing::TaskCategory;

use super::EscalationReason;

/// Human team a ticket is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanQueue {
    Support,
    Complaints,
    Marketing,
}

impl HumanQueue {
    /// Picks the queue for an escalation.
    pub fn for_escalation(reason: EscalationReason, category: Option<TaskCategory>) -> Self {
        match (reason, category) {
            (EscalationReason::UnresolvedComplaint, _) | (_, Some(TaskCategory::Complaint)) => {
                HumanQueue::Complaints
            }
            (_, Some(c)) if c.is_marketing() => HumanQueue::Marketing,
            _ => HumanQueue::Support,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HumanQueue::Support => "support",
            HumanQueue::Complaints => "complaints",
            HumanQueue::Marketing => "marketing",
        }
    }
}

impl fmt::Display for HumanQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HumanQueue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "support" => Ok(HumanQueue::Support),
            "complaints" => Ok(HumanQueue::Complaints),
            "marketing" => Ok(HumanQueue::Marketing),
            other => Err(format!("unknown human queue '{}'", other)),
        }
    }
}

/// Hand-off of a conversation to a human operator.
///
/// Once raised, automated handling of the conversation stops until a human
/// closes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationTicket {
    pub id: TicketId,
    pub conversation_id: ConversationId,
    pub session_id: SessionId,
    pub reason: EscalationReason,
    /// Recent customer sentiment at the time of escalation, oldest first.
    pub sentiment_snapshot: Vec<SentimentScore>,
    pub destination: HumanQueue,
    pub created_at: Timestamp,
}

/// How many recent scores a ticket snapshots.
const SNAPSHOT_LEN: usize = 5;

impl EscalationTicket {
    /// Raises a ticket for the conversation as it stands.
    pub fn raise(conversation: &Conversation, reason: EscalationReason, now: Timestamp) -> Self {
        Self {
            id: TicketId::new(),
            conversation_id: conversation.id().clone(),
            session_id: *conversation.session_id(),
            reason,
            sentiment_snapshot: conversation.recent_customer_sentiment(SNAPSHOT_LEN),
            destination: HumanQueue::for_escalation(reason, conversation.category()),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_complaints_go_to_complaints_queue() {
        assert_eq!(
            HumanQueue::for_escalation(EscalationReason::UnresolvedComplaint, None),
            HumanQueue::Complaints
        );
        assert_eq!(
            HumanQueue::for_escalation(EscalationReason::CustomerRequest, Some(TaskCategory::Complaint)),
            HumanQueue::Complaints
        );
    }

    #[test]
    fn marketing_categories_go_to_marketing_queue() {
        assert_eq!(
            HumanQueue::for_escalation(
                EscalationReason::SustainedNegativeSentiment,
                Some(TaskCategory::ContentRequest)
            ),
            HumanQueue::Marketing
        );
    }

    #[test]
    fn everything_else_goes_to_support() {
        assert_eq!(
            HumanQueue::for_escalation(EscalationReason::CustomerRequest, None),
            HumanQueue::Support
        );
    }
}
