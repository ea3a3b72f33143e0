//! Conversation lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a conversation.
///
/// ```text
/// Active ──▶ Escalated ──▶ Closed
///   │                        ▲
///   └────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Automated agents are handling the conversation.
    #[default]
    Active,
    /// Handed off to a human; automated handling is suspended.
    Escalated,
    /// Finished. Nothing can be appended.
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Escalated => "escalated",
            ConversationStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "escalated" => Ok(ConversationStatus::Escalated),
            "closed" => Ok(ConversationStatus::Closed),
            other => Err(format!("unknown conversation status '{}'", other)),
        }
    }
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationStatus::*;
        matches!(
            (self, target),
            (Active, Escalated) | (Escalated, Closed) | (Active, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationStatus::*;
        match self {
            Active => vec![Escalated, Closed],
            Escalated => vec![Closed],
            Closed => vec![],
        }
    }
}
