//! Escalation module - hand-off of conversations to human operators.

mod policy;
mod ticket;

pub use policy::{
    default_human_request_phrases, EscalationDecision, EscalationPolicy, EscalationReason,
    EscalationRules,
};
pub use ticket::{EscalationTicket, HumanQueue};
