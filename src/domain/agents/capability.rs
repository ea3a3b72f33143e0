//! The uniform contract every agent implements.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{AgentKind, Conversation, Turn};
use crate::domain::foundation::ConversationId;
use crate::domain::knowledge::KnowledgeSnippet;
use crate::domain::routing::{Task, TaskCategory};
use crate::ports::AIError;

/// What an agent sees of the conversation.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub conversation_id: ConversationId,
    pub language: String,
    /// Most recent turns before the current message, oldest first.
    pub history: Vec<Turn>,
}

impl AgentContext {
    /// Builds a context holding at most `max_history` turns of `conversation`.
    pub fn from_conversation(conversation: &Conversation, max_history: usize) -> Self {
        Self {
            conversation_id: conversation.id().clone(),
            language: conversation.language().to_string(),
            history: conversation.recent_turns(max_history).to_vec(),
        }
    }
}

/// An agent's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub text: String,
    /// How sure the agent is, in `[0.0, 1.0]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("model backend failed: {0}")]
    Model(#[from] AIError),

    #[error("agent produced an empty reply")]
    EmptyReply,
}

/// Handles a task. Support, Marketing and General all implement this so the
/// orchestrator never branches on which agent it is talking to.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Categories this agent wants to be registered for.
    fn categories(&self) -> &'static [TaskCategory];

    async fn handle(
        &self,
        task: &Task,
        context: &AgentContext,
        knowledge: &[KnowledgeSnippet],
    ) -> Result<AgentResponse, AgentError>;
}
