use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::conversation::AgentKind;
use crate::domain::knowledge::KnowledgeSnippet;
use crate::domain::routing::{Task, TaskCategory};
use crate::ports::AIProvider;

use super::prompt::{self, ModelSettings};
use super::{AgentCapability, AgentContext, AgentError, AgentResponse};

const ROLE: &str = "You are LipaChat's friendly front-desk assistant on WhatsApp.";

const GOALS: &[&str] = &[
    "Greet the customer and work out what they need",
    "Answer simple questions about LipaChat directly",
    "Offer to connect them with support or marketing for anything specialised",
];

/// General inquiry agent. Registered as the registry fallback.
pub struct GeneralAgent {
    provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
}

impl GeneralAgent {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl AgentCapability for GeneralAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::General
    }

    fn categories(&self) -> &'static [TaskCategory] {
        &[]
    }

    async fn handle(
        &self,
        task: &Task,
        context: &AgentContext,
        knowledge: &[KnowledgeSnippet],
    ) -> Result<AgentResponse, AgentError> {
        let system = prompt::system_prompt(ROLE, GOALS, None, &context.language, knowledge);
        prompt::complete(
            &self.provider,
            &self.settings,
            "general",
            system,
            task,
            context,
            knowledge,
        )
        .await
    }
}
