use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::conversation::AgentKind;
use crate::domain::knowledge::KnowledgeSnippet;
use crate::domain::routing::{Task, TaskCategory};
use crate::ports::AIProvider;

use super::prompt::{self, ModelSettings};
use super::{AgentCapability, AgentContext, AgentError, AgentResponse};

const ROLE: &str = "You are a marketing strategist at LipaChat with deep knowledge of the Kenyan \
and East African digital market. You write engaging, culturally relevant content and turn \
campaign numbers into practical advice.";

const GOALS: &[&str] = &[
    "Produce content that fits LipaChat's brand and the stated audience",
    "Ground analysis in the data the customer provides; say when data is missing",
    "Recommend concrete next actions",
];

const CATEGORIES: &[TaskCategory] = &[
    TaskCategory::ContentRequest,
    TaskCategory::AnalyticsRequest,
    TaskCategory::SegmentationRequest,
];

/// Marketing agent: content, analytics and segmentation requests.
pub struct MarketingAgent {
    provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
}

impl MarketingAgent {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    fn guidance(category: TaskCategory) -> Option<&'static str> {
        match category {
            TaskCategory::ContentRequest => Some(
                "Write the requested piece directly. Use a warm, professional tone unless asked otherwise, and end with a call to action.",
            ),
            TaskCategory::AnalyticsRequest => Some(
                "Summarise the key metrics first, then give at most three insights and recommendations.",
            ),
            TaskCategory::SegmentationRequest => Some(
                "Propose distinct segments with a one-line description, size hint and messaging angle for each.",
            ),
            _ => None,
        }
    }
}

#[async_trait]
impl AgentCapability for MarketingAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Marketing
    }

    fn categories(&self) -> &'static [TaskCategory] {
        CATEGORIES
    }

    async fn handle(
        &self,
        task: &Task,
        context: &AgentContext,
        knowledge: &[KnowledgeSnippet],
    ) -> Result<AgentResponse, AgentError> {
        let system = prompt::system_prompt(
            ROLE,
            GOALS,
            Self::guidance(task.category),
            &context.language,
            knowledge,
        );
        prompt::complete(
            &self.provider,
            &self.settings,
            "marketing",
            system,
            task,
            context,
            knowledge,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::foundation::{Channel, ConversationId, CustomerId};

    #[tokio::test]
    async fn segmentation_prompt_mentions_segments() {
        let provider = MockAIProvider::new().with_response("Segment A: students");
        let agent = MarketingAgent::new(Arc::new(provider.clone()), ModelSettings::default());
        let id = ConversationId::new(CustomerId::new("+254700000011").unwrap(), Channel::Web);
        let context = AgentContext {
            conversation_id: id.clone(),
            language: "sw".into(),
            history: Vec::new(),
        };

        let response = agent
            .handle(
                &Task::new(TaskCategory::SegmentationRequest, "Who should we target?", id, "sw"),
                &context,
                &[],
            )
            .await
            .unwrap();

        assert_eq!(response.text, "Segment A: students");
        let system = provider.get_calls()[0].system_prompt.clone().unwrap();
        assert!(system.contains("segments"));
        assert!(system.contains("Kiswahili"));
    }

    #[test]
    fn declares_marketing_categories() {
        let agent = MarketingAgent::new(Arc::new(MockAIProvider::new()), ModelSettings::default());
        assert!(agent.categories().iter().all(TaskCategory::is_marketing));
        assert_eq!(agent.kind(), AgentKind::Marketing);
    }
}
