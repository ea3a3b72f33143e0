//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the orchestration domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{Channel, ConversationId, CustomerId, SessionId, TicketId, TurnId};
pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
