//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamp, errors, state machine)
//! - `conversation` - Conversation aggregate, turns, status and sentiment trend
//! - `routing` - Task categories and intent classification
//! - `escalation` - Escalation policy and tickets
//! - `knowledge` - Knowledge snippets and retrieval
//! - `agents` - Agent capabilities and the registry that dispatches to them

pub mod agents;
pub mod conversation;
pub mod escalation;
pub mod foundation;
pub mod knowledge;
pub mod routing;
