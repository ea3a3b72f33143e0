use thiserror::Error;

use crate::domain::foundation::{ConversationId, TransitionError};

/// Errors raised by the conversation aggregate itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversationError {
    #[error("conversation {0} is closed")]
    Closed(ConversationId),

    #[error("conversation {id}: {source}")]
    InvalidTransition {
        id: ConversationId,
        #[source]
        source: TransitionError,
    },
}
