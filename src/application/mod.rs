//! Application layer - the message pipeline and its background work.
//!
//! - `Orchestrator` - handles one inbound message end to end
//! - `ConversationLocks` - single writer per conversation id
//! - `SentimentMonitor` - bounded, failure-absorbing sentiment scoring
//! - `ExpirySweeper` - closes inactive conversations

mod conversation_locks;
mod expiry_sweeper;
mod orchestrator;
mod sentiment_monitor;

pub use conversation_locks::ConversationLocks;
pub use expiry_sweeper::ExpirySweeper;
pub use orchestrator::{
    Collaborators, DispatchFailure, EscalationPayload, InboundMessage, Orchestrator,
    OrchestratorError, OrchestratorSettings, Outcome, ReplyPayload,
};
pub use sentiment_monitor::SentimentMonitor;
