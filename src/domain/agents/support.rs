use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::conversation::AgentKind;
use crate::domain::knowledge::KnowledgeSnippet;
use crate::domain::routing::{Task, TaskCategory};
use crate::ports::AIProvider;

use super::prompt::{self, ModelSettings};
use super::{AgentCapability, AgentContext, AgentError, AgentResponse};

const ROLE: &str = "You are an experienced customer support specialist at LipaChat, a Kenyan \
messaging and payments company. You know LipaChat Messenger and LipaPay well, including M-Pesa, \
Airtel Money and card payments, and you understand East African mobile and payment habits.";

const GOALS: &[&str] = &[
    "Answer questions accurately using LipaChat knowledge",
    "Walk customers through troubleshooting one step at a time",
    "Protect account security: never ask for PINs or full passwords",
    "Leave the customer with a clear next step",
];

const CATEGORIES: &[TaskCategory] = &[
    TaskCategory::SupportQuery,
    TaskCategory::Troubleshooting,
    TaskCategory::AccountInquiry,
    TaskCategory::Complaint,
    TaskCategory::SubscriptionInquiry,
];

/// Support agent: questions, troubleshooting, accounts, complaints and
/// subscriptions.
pub struct SupportAgent {
    provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
}

impl SupportAgent {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    fn guidance(category: TaskCategory) -> Option<&'static str> {
        match category {
            TaskCategory::Complaint => Some(
                "The customer is unhappy. Acknowledge the problem and apologise once, then focus on fixing it.",
            ),
            TaskCategory::Troubleshooting => {
                Some("Suggest the most likely fix first and ask the customer to confirm whether it worked.")
            }
            TaskCategory::SubscriptionInquiry => {
                Some("Quote plan prices exactly as given in the knowledge; say so if a price is not listed.")
            }
            _ => None,
        }
    }
}

#[async_trait]
impl AgentCapability for SupportAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Support
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
            "support",
            system,
            task,
            context,
            knowledge,
        )
        .await
    }
}
