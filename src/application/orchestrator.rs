//! Orchestrator - the per-message pipeline.
//!
//! ```text
//! Received → Classified → SentimentScored → PolicyEvaluated
//!          → Escalated                          (ticket, no agent)
//!          → Dispatched → Persisted → Responded (agent reply)
//! ```
//!
//! Messages for one conversation are serialized by [`ConversationLocks`];
//! everything a message changes is written with a single
//! [`ConversationStore::commit`], so an aborted request leaves no partial
//! state behind.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::agents::{
    AgentCapability, AgentContext, AgentError, AgentKind, AgentRegistry, AgentResponse,
    RegistryError,
};
use crate::domain::conversation::{
    Conversation, ConversationError, ConversationStatus, ConversationUpdate, Turn, TurnMarker,
};
use crate::domain::escalation::{EscalationPolicy, EscalationReason, EscalationTicket, HumanQueue};
use crate::domain::foundation::{Channel, ConversationId, CustomerId, TicketId, Timestamp};
use crate::domain::knowledge::{KnowledgeRetriever, KnowledgeSnippet};
use crate::domain::routing::{IntentClassifier, Task, TaskCategory};
use crate::ports::{ConversationStore, MessagingTransport, StoreError};

use super::{ConversationLocks, SentimentMonitor};

// ════════════════════════════════════════════════════════════════════════════
// Inputs and outputs
// ════════════════════════════════════════════════════════════════════════════

/// One inbound customer message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub customer: CustomerId,
    pub channel: Channel,
    pub text: String,
    /// When the customer sent the message, as reported by the channel.
    pub timestamp: Timestamp,
    /// When the message reached us. Conversation activity and expiry run on
    /// this clock.
    pub received_at: Timestamp,
    /// Language hint from the channel, e.g. `"sw"`.
    pub language: Option<String>,
}

impl InboundMessage {
    pub fn new(
        customer: CustomerId,
        channel: Channel,
        text: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            customer,
            channel,
            text: text.into(),
            timestamp,
            received_at: timestamp,
            language: None,
        }
    }

    pub fn with_received_at(mut self, received_at: Timestamp) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn conversation_id(&self) -> ConversationId {
        ConversationId::new(self.customer.clone(), self.channel)
    }
}

/// Result of handling a message: `{"type": "reply" | "escalation", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Outcome {
    Reply(ReplyPayload),
    Escalation(EscalationPayload),
}

impl Outcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, Outcome::Reply(_))
    }

    pub fn escalation_reason(&self) -> Option<EscalationReason> {
        match self {
            Outcome::Escalation(payload) => Some(payload.reason),
            Outcome::Reply(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub text: String,
    pub agent: AgentKind,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPayload {
    pub ticket_id: TicketId,
    pub reason: EscalationReason,
    pub destination: HumanQueue,
}

impl From<&EscalationTicket> for EscalationPayload {
    fn from(ticket: &EscalationTicket) -> Self {
        Self {
            ticket_id: ticket.id,
            reason: ticket.reason,
            destination: ticket.destination,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// An agent capability could not produce a reply.
#[derive(Debug, Clone, Error)]
pub enum DispatchFailure {
    #[error("{agent} agent failed: {source}")]
    Agent {
        agent: AgentKind,
        #[source]
        source: AgentError,
    },

    #[error("{agent} agent timed out after {}ms", .after.as_millis())]
    Timeout { agent: AgentKind, after: Duration },
}

/// Errors surfaced to the caller. Everything else degrades in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ConversationId,
        from: String,
        to: String,
    },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for OrchestratorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OrchestratorError::NotFound(id),
            StoreError::InvalidTransition { id, from, to } => {
                OrchestratorError::InvalidTransition { id, from, to }
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => {
                OrchestratorError::Storage(msg)
            }
        }
    }
}

impl From<ConversationError> for OrchestratorError {
    fn from(err: ConversationError) -> Self {
        StoreError::from(err).into()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Orchestrator
// ════════════════════════════════════════════════════════════════════════════

/// Tunables for the pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Turns of history handed to agents.
    pub max_history_turns: usize,
    /// Turns of history handed to the sentiment scorer.
    pub sentiment_history_turns: usize,
    pub agent_timeout: Duration,
    pub supported_languages: Vec<String>,
    pub default_language: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
            sentiment_history_turns: 6,
            agent_timeout: Duration::from_secs(30),
            supported_languages: vec!["en".to_string(), "sw".to_string()],
            default_language: "en".to_string(),
        }
    }
}

/// Everything the orchestrator talks to.
pub struct Collaborators {
    pub store: Arc<dyn ConversationStore>,
    pub transport: Arc<dyn MessagingTransport>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub sentiment: SentimentMonitor,
    pub policy: EscalationPolicy,
    pub registry: AgentRegistry,
    pub retriever: KnowledgeRetriever,
}

pub struct Orchestrator {
    store: Arc<dyn ConversationStore>,
    transport: Arc<dyn MessagingTransport>,
    classifier: Arc<dyn IntentClassifier>,
    sentiment: SentimentMonitor,
    policy: EscalationPolicy,
    registry: AgentRegistry,
    retriever: KnowledgeRetriever,
    locks: ConversationLocks,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(parts: Collaborators, settings: OrchestratorSettings) -> Self {
        Self {
            store: parts.store,
            transport: parts.transport,
            classifier: parts.classifier,
            sentiment: parts.sentiment,
            policy: parts.policy,
            registry: parts.registry,
            retriever: parts.retriever,
            locks: ConversationLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Handles one inbound message end to end.
    ///
    /// The customer always gets a reply or an escalation outcome; only store
    /// contract violations are returned as errors.
    #[tracing::instrument(
        skip(self, message),
        fields(conversation_id = %message.conversation_id())
    )]
    pub async fn handle_message(&self, message: InboundMessage) -> Result<Outcome, OrchestratorError> {
        let id = message.conversation_id();
        let _guard = self.locks.acquire(&id).await;

        let conversation = self.store.load(&id, message.received_at).await?;
        let language = self.resolve_language(message.language.as_deref(), &conversation);

        // Classified
        let category = self.classifier.classify(&message.text);
        let resolved = self.classifier.signals_resolution(&message.text);
        tracing::debug!(stage = "classified", %category, resolved);

        if let Some(ticket) = conversation.ticket() {
            return self.hold_for_human(&id, &message, category, ticket.clone()).await;
        }

        // SentimentScored
        let sentiment = self
            .sentiment
            .score(
                &id,
                &message.text,
                conversation.recent_turns(self.settings.sentiment_history_turns),
            )
            .await;
        tracing::debug!(stage = "sentiment_scored", score = ?sentiment.map(|s| s.value()));

        let mut update = ConversationUpdate::new()
            .with_turn(Turn::customer(
                message.text.clone(),
                message.timestamp,
                sentiment,
                category,
            ))
            .with_activity_at(message.received_at);
        if language != conversation.language() {
            update = update.with_language(language.clone());
        }
        if resolved {
            update = update.with_turn(Turn::system(
                "Customer confirmed the issue is resolved",
                message.received_at,
                Some(TurnMarker::Resolved),
            ));
        }

        // PolicyEvaluated
        let preview = update.applied_to(&conversation)?;
        let decision = self.policy.evaluate(&preview);
        tracing::debug!(stage = "policy_evaluated", escalate = decision.escalate, reason = ?decision.reason);

        match decision.reason.filter(|_| decision.escalate) {
            Some(reason) => self.escalate(&id, &preview, update, reason, &message).await,
            None => self.dispatch(&id, &conversation, update, category, &language, &message).await,
        }
    }

    /// Closes a conversation on behalf of a human operator.
    ///
    /// Closing an already closed conversation is an `InvalidTransition`.
    #[tracing::instrument(skip(self), fields(conversation_id = %id))]
    pub async fn close_conversation(&self, id: &ConversationId) -> Result<Conversation, OrchestratorError> {
        let _guard = self.locks.acquire(id).await;

        self.store.set_status(id, ConversationStatus::Closed).await?;
        let closed = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;
        tracing::info!("conversation closed by operator");
        Ok(closed)
    }

    /// Current conversation for `id`, if any.
    pub async fn conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, OrchestratorError> {
        Ok(self.store.find(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stages
    // ─────────────────────────────────────────────────────────────────────────

    /// A human already owns the conversation: record the message and return
    /// the existing ticket. No agent runs and the queue is not notified again.
    async fn hold_for_human(
        &self,
        id: &ConversationId,
        message: &InboundMessage,
        category: TaskCategory,
        ticket: EscalationTicket,
    ) -> Result<Outcome, OrchestratorError> {
        self.store
            .commit(
                id,
                ConversationUpdate::new()
                    .with_turn(Turn::customer(
                        message.text.clone(),
                        message.timestamp,
                        None,
                        category,
                    ))
                    .with_activity_at(message.received_at),
            )
            .await?;
        tracing::debug!(stage = "escalated", ticket_id = %ticket.id, "conversation already with a human");
        Ok(Outcome::Escalation(EscalationPayload::from(&ticket)))
    }

    async fn escalate(
        &self,
        id: &ConversationId,
        preview: &Conversation,
        update: ConversationUpdate,
        reason: EscalationReason,
        message: &InboundMessage,
    ) -> Result<Outcome, OrchestratorError> {
        let ticket = EscalationTicket::raise(preview, reason, message.received_at);
        let update = update
            .with_turn(Turn::system(
                format!("Handed off to the {} queue: {}", ticket.destination, reason),
                message.received_at,
                Some(TurnMarker::HandedOff),
            ))
            .with_ticket(ticket.clone());

        // Persisted
        let committed = self.store.commit(id, update).await?;
        tracing::info!(
            stage = "escalated",
            ticket_id = %ticket.id,
            %reason,
            destination = %ticket.destination,
            "conversation escalated"
        );

        if let Err(err) = self.transport.notify_human(&ticket).await {
            tracing::error!(ticket_id = %ticket.id, error = %err, "failed to notify human queue");
        }
        self.send(id, &handoff_notice(committed.language())).await;

        Ok(Outcome::Escalation(EscalationPayload::from(&ticket)))
    }

    async fn dispatch(
        &self,
        id: &ConversationId,
        before: &Conversation,
        update: ConversationUpdate,
        category: TaskCategory,
        language: &str,
        message: &InboundMessage,
    ) -> Result<Outcome, OrchestratorError> {
        let task = Task::new(category, message.text.clone(), id.clone(), language);
        let mut context = AgentContext::from_conversation(before, self.settings.max_history_turns);
        context.language = language.to_string();

        let knowledge = self.retriever.retrieve(&message.text).await;

        let primary = match self.registry.resolve(category) {
            Ok(capability) => capability,
            Err(RegistryError::UnknownCategory(c)) => {
                tracing::debug!(category = %c, "no agent registered, using fallback");
                self.registry.fallback()
            }
        };

        // Dispatched
        let (reply, agent) = match self.run(&primary, &task, &context, &knowledge).await {
            Ok(response) => (response, primary.kind()),
            Err(failure) => {
                tracing::warn!(error = %failure, "dispatch failed, retrying with fallback");
                let fallback = self.registry.fallback();
                match self.run(&fallback, &task, &context, &knowledge).await {
                    Ok(response) => (response, AgentKind::Fallback),
                    Err(failure) => {
                        tracing::error!(error = %failure, "fallback dispatch failed, sending apology");
                        (
                            AgentResponse {
                                text: apology(language).to_string(),
                                confidence: 0.0,
                            },
                            AgentKind::Fallback,
                        )
                    }
                }
            }
        };
        tracing::debug!(stage = "dispatched", %agent, confidence = reply.confidence);

        // Persisted
        let replied_at = Timestamp::now().max(message.received_at);
        self.store
            .commit(id, update.with_turn(Turn::agent(reply.text.clone(), replied_at, agent)))
            .await?;

        // Responded
        self.send(id, &reply.text).await;
        Ok(Outcome::Reply(ReplyPayload {
            text: reply.text,
            agent,
            confidence: reply.confidence,
        }))
    }

    async fn run(
        &self,
        capability: &Arc<dyn AgentCapability>,
        task: &Task,
        context: &AgentContext,
        knowledge: &[KnowledgeSnippet],
    ) -> Result<AgentResponse, DispatchFailure> {
        let agent = capability.kind();
        match tokio::time::timeout(
            self.settings.agent_timeout,
            capability.handle(task, context, knowledge),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(source)) => Err(DispatchFailure::Agent { agent, source }),
            Err(_) => Err(DispatchFailure::Timeout {
                agent,
                after: self.settings.agent_timeout,
            }),
        }
    }

    /// Transport failures never undo what was persisted.
    async fn send(&self, id: &ConversationId, text: &str) {
        if let Err(err) = self.transport.send_reply(id.customer(), id.channel(), text).await {
            tracing::error!(error = %err, "failed to deliver reply");
        }
    }

    fn resolve_language(&self, hint: Option<&str>, conversation: &Conversation) -> String {
        match hint.map(|h| h.trim().to_lowercase()) {
            Some(code) if self.settings.supported_languages.contains(&code) => code,
            Some(code) => {
                tracing::warn!(language = %code, "unsupported language, using default");
                self.settings.default_language.clone()
            }
            None => conversation.language().to_string(),
        }
    }
}

fn handoff_notice(language: &str) -> &'static str {
    match language {
        "sw" => "Ninakuunganisha na mhudumu wetu. Atakujibu hapa hivi punde.",
        _ => "I'm connecting you with a member of our team. They'll reply here shortly.",
    }
}

fn apology(language: &str) -> &'static str {
    match language {
        "sw" => "Samahani, nina shida kujibu sasa hivi. Tafadhali jaribu tena baada ya muda mfupi.",
        _ => "Sorry, I'm having trouble answering right now. Please try again in a moment.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_type_and_payload() {
        let outcome = Outcome::Reply(ReplyPayload {
            text: "Hi".into(),
            agent: AgentKind::Support,
            confidence: 0.5,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "reply");
        assert_eq!(json["payload"]["agent"], "support");
    }

    #[test]
    fn escalation_reason_uses_pascal_case() {
        let outcome = Outcome::Escalation(EscalationPayload {
            ticket_id: TicketId::new(),
            reason: EscalationReason::CustomerRequest,
            destination: HumanQueue::Support,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "escalation");
        assert_eq!(json["payload"]["reason"], "CustomerRequest");
        assert_eq!(outcome.escalation_reason(), Some(EscalationReason::CustomerRequest));
    }

    #[test]
    fn store_errors_map_to_orchestrator_errors() {
        assert_eq!(
            OrchestratorError::from(StoreError::Database("down".into())),
            OrchestratorError::Storage("down".into())
        );
    }

    #[test]
    fn canned_texts_follow_language() {
        assert!(apology("sw").starts_with("Samahani"));
        assert!(handoff_notice("en").contains("member of our team"));
        assert!(handoff_notice("fr").contains("member of our team"));
    }
}
