//! Agent Registry - explicit category → capability mapping built at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::routing::TaskCategory;

use super::AgentCapability;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no agent registered for category {0}")]
    UnknownCategory(TaskCategory),
}

/// Maps task categories to agent capabilities.
///
/// Also owns the fallback capability used for unknown categories and for
/// the single retry after a dispatch failure.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: HashMap<TaskCategory, Arc<dyn AgentCapability>>,
    fallback: Arc<dyn AgentCapability>,
}

impl AgentRegistry {
    pub fn new(fallback: Arc<dyn AgentCapability>) -> Self {
        Self {
            agents: HashMap::new(),
            fallback,
        }
    }

    /// Registers `capability` for `category`, replacing any previous one.
    pub fn register(&mut self, category: TaskCategory, capability: Arc<dyn AgentCapability>) {
        if let Some(previous) = self.agents.insert(category, capability) {
            tracing::debug!(
                %category,
                replaced = %previous.kind(),
                "agent registration replaced"
            );
        }
    }

    /// Registers `capability` for every category it declares.
    pub fn register_all(&mut self, capability: Arc<dyn AgentCapability>) {
        for category in capability.categories() {
            self.register(*category, Arc::clone(&capability));
        }
    }

    /// Builder form of [`register_all`](Self::register_all).
    pub fn with(mut self, capability: Arc<dyn AgentCapability>) -> Self {
        self.register_all(capability);
        self
    }

    pub fn resolve(&self, category: TaskCategory) -> Result<Arc<dyn AgentCapability>, RegistryError> {
        self.agents
            .get(&category)
            .cloned()
            .ok_or(RegistryError::UnknownCategory(category))
    }

    pub fn fallback(&self) -> Arc<dyn AgentCapability> {
        Arc::clone(&self.fallback)
    }

    pub fn registered_categories(&self) -> Vec<TaskCategory> {
        let mut categories: Vec<_> = self.agents.keys().copied().collect();
        categories.sort();
        categories
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agents: Vec<_> = self
            .registered_categories()
            .into_iter()
            .filter_map(|c| self.agents.get(&c).map(|a| (c, a.kind())))
            .collect();
        f.debug_struct("AgentRegistry")
            .field("agents", &agents)
            .field("fallback", &self.fallback.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agents::{AgentContext, AgentError, AgentResponse};
    use crate::domain::conversation::AgentKind;
    use crate::domain::knowledge::KnowledgeSnippet;
    use crate::domain::routing::Task;
    use async_trait::async_trait;

    struct Stub(AgentKind, &'static [TaskCategory]);

    #[async_trait]
    impl AgentCapability for Stub {
        fn kind(&self) -> AgentKind {
            self.0
        }

        fn categories(&self) -> &'static [TaskCategory] {
            self.1
        }

        async fn handle(
            &self,
            _task: &Task,
            _context: &AgentContext,
            _knowledge: &[KnowledgeSnippet],
        ) -> Result<AgentResponse, AgentError> {
            Ok(AgentResponse {
                text: self.0.to_string(),
                confidence: 1.0,
            })
        }
    }

    fn registry() -> AgentRegistry {
        AgentRegistry::new(Arc::new(Stub(AgentKind::General, &[])))
            .with(Arc::new(Stub(
                AgentKind::Support,
                &[TaskCategory::SupportQuery, TaskCategory::Complaint],
            )))
            .with(Arc::new(Stub(AgentKind::Marketing, &[TaskCategory::ContentRequest])))
    }

    #[test]
    fn resolves_registered_categories() {
        let registry = registry();
        assert_eq!(
            registry.resolve(TaskCategory::Complaint).unwrap().kind(),
            AgentKind::Support
        );
        assert_eq!(
            registry.resolve(TaskCategory::ContentRequest).unwrap().kind(),
            AgentKind::Marketing
        );
    }

    #[test]
    fn unknown_category_fails() {
        let err = registry().resolve(TaskCategory::GeneralInquiry).err();
        assert_eq!(err, Some(RegistryError::UnknownCategory(TaskCategory::GeneralInquiry)));
    }

    #[test]
    fn register_replaces_previous() {
        let mut registry = registry();
        registry.register(
            TaskCategory::Complaint,
            Arc::new(Stub(AgentKind::Marketing, &[])),
        );
        assert_eq!(
            registry.resolve(TaskCategory::Complaint).unwrap().kind(),
            AgentKind::Marketing
        );
    }

    #[test]
    fn fallback_is_always_available() {
        assert_eq!(registry().fallback().kind(), AgentKind::General);
    }

    #[test]
    fn registered_categories_are_sorted() {
        assert_eq!(
            registry().registered_categories(),
            vec![
                TaskCategory::SupportQuery,
                TaskCategory::Complaint,
                TaskCategory::ContentRequest
            ]
        );
    }
}
