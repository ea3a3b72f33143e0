//! Batched changes committed to a conversation in one step.

use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::Timestamp;

use super::errors::ConversationError;
use super::{Conversation, ConversationStatus, Turn};

/// Everything one inbound message changes on a conversation.
///
/// Stores apply an update all-or-nothing: either every turn, the language,
/// the ticket and the status change land, or none do.
#[derive(Debug, Clone, Default)]
pub struct ConversationUpdate {
    pub turns: Vec<Turn>,
    pub language: Option<String>,
    pub ticket: Option<EscalationTicket>,
    pub status: Option<ConversationStatus>,
    /// When the message was received; drives inactivity expiry.
    pub active_at: Option<Timestamp>,
}

impl ConversationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Escalates the conversation with this ticket.
    pub fn with_ticket(mut self, ticket: EscalationTicket) -> Self {
        self.ticket = Some(ticket);
        self
    }

    pub fn with_status(mut self, status: ConversationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_activity_at(mut self, at: Timestamp) -> Self {
        self.active_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
            && self.language.is_none()
            && self.ticket.is_none()
            && self.status.is_none()
            && self.active_at.is_none()
    }

    /// Applies the update to a copy of `conversation`, leaving the original
    /// untouched when any step fails.
    pub fn applied_to(&self, conversation: &Conversation) -> Result<Conversation, ConversationError> {
        let mut next = conversation.clone();
        if let Some(language) = &self.language {
            next.set_language(language.clone());
        }
        for turn in &self.turns {
            next.append(turn.clone())?;
        }
        if let Some(at) = self.active_at {
            next.touch(at);
        }
        if let Some(ticket) = &self.ticket {
            next.escalate(ticket.clone())?;
        }
        if let Some(status) = self.status {
            if status != next.status() {
                next.apply_status(status)?;
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::EscalationReason;
    use crate::domain::foundation::{Channel, ConversationId, CustomerId, Timestamp};
    use crate::domain::routing::TaskCategory;

    fn conversation() -> Conversation {
        let id = ConversationId::new(CustomerId::new("+254700000002").unwrap(), Channel::Sms);
        Conversation::open(id, "en", Timestamp::now())
    }

    #[test]
    fn update_applies_turns_then_ticket() {
        let c = conversation();
        let ticket = EscalationTicket::raise(&c, EscalationReason::CustomerRequest, Timestamp::now());
        let update = ConversationUpdate::new()
            .with_turn(Turn::customer("human please", Timestamp::now(), None, TaskCategory::SupportQuery))
            .with_ticket(ticket);

        let next = update.applied_to(&c).unwrap();
        assert_eq!(next.turn_count(), 1);
        assert_eq!(next.status(), ConversationStatus::Escalated);
        assert_eq!(c.turn_count(), 0);
    }

    #[test]
    fn failed_update_leaves_original_untouched() {
        let mut c = conversation();
        c.close().unwrap();
        let update = ConversationUpdate::new()
            .with_turn(Turn::customer("hello", Timestamp::now(), None, TaskCategory::SupportQuery));

        assert!(update.applied_to(&c).is_err());
        assert_eq!(c.turn_count(), 0);
    }

    #[test]
    fn status_equal_to_current_is_a_no_op() {
        let c = conversation();
        let next = ConversationUpdate::new()
            .with_status(ConversationStatus::Active)
            .applied_to(&c)
            .unwrap();
        assert_eq!(next.status(), ConversationStatus::Active);
    }

    #[test]
    fn activity_time_outranks_an_older_turn_timestamp() {
        let c = conversation();
        let received = c.last_activity_at().plus_secs(60);
        let sent = c.last_activity_at().minus_secs(3 * 86_400);

        let next = ConversationUpdate::new()
            .with_turn(Turn::customer("hello", sent, None, TaskCategory::SupportQuery))
            .with_activity_at(received)
            .applied_to(&c)
            .unwrap();
        assert_eq!(*next.last_activity_at(), received);
        assert_eq!(*next.turns()[0].timestamp(), sent);

        let stale = ConversationUpdate::new()
            .with_activity_at(sent)
            .applied_to(&next)
            .unwrap();
        assert_eq!(*stale.last_activity_at(), received);
    }
}
