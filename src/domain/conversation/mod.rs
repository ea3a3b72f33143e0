//! Conversation module - per-customer conversation state.
//!
//! A conversation is keyed by customer and channel, owns its ordered turns
//! and sentiment trend, and moves through
//! `Active → Escalated → Closed` or `Active → Closed`.

mod aggregate;
mod errors;
mod sentiment;
mod status;
mod turn;
mod update;

pub use aggregate::Conversation;
pub use errors::ConversationError;
pub use sentiment::{SentimentScore, SentimentTrend};
pub use status::ConversationStatus;
pub use turn::{AgentKind, Speaker, Turn, TurnMarker};
pub use update::ConversationUpdate;
