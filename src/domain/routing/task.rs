use crate::domain::foundation::ConversationId;

use super::TaskCategory;

/// A unit of work handed to an agent capability.
///
/// Refers to its conversation by id only; the task never owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub category: TaskCategory,
    pub payload: String,
    pub conversation_id: ConversationId,
    pub language: String,
}

impl Task {
    pub fn new(
        category: TaskCategory,
        payload: impl Into<String>,
        conversation_id: ConversationId,
        language: impl Into<String>,
    ) -> Self {
        Self {
            category,
            payload: payload.into(),
            conversation_id,
            language: language.into(),
        }
    }
}
