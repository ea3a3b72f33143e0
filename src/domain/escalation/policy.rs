//! Escalation Policy - decides when a conversation goes to a human.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. The latest customer message asks for a human → `CustomerRequest`
//! 2. The last `sentiment_window` customer turns all scored below
//!    `negative_threshold` → `SustainedNegativeSentiment`
//! 3. The conversation is about a complaint and has more than
//!    `unresolved_attempt_limit` customer turns since the last resolution
//!    marker → `UnresolvedComplaint`
//!
//! Explicit requests always outrank inferred ones.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::Conversation;
use crate::domain::routing::{words, Phrase, TaskCategory};

/// Why a conversation was escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscalationReason {
    CustomerRequest,
    SustainedNegativeSentiment,
    UnresolvedComplaint,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::CustomerRequest => "CustomerRequest",
            EscalationReason::SustainedNegativeSentiment => "SustainedNegativeSentiment",
            EscalationReason::UnresolvedComplaint => "UnresolvedComplaint",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EscalationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CustomerRequest" => Ok(EscalationReason::CustomerRequest),
            "SustainedNegativeSentiment" => Ok(EscalationReason::SustainedNegativeSentiment),
            "UnresolvedComplaint" => Ok(EscalationReason::UnresolvedComplaint),
            other => Err(format!("unknown escalation reason '{}'", other)),
        }
    }
}

/// Outcome of evaluating the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationDecision {
    pub escalate: bool,
    pub reason: Option<EscalationReason>,
}

impl EscalationDecision {
    pub fn escalate(reason: EscalationReason) -> Self {
        Self {
            escalate: true,
            reason: Some(reason),
        }
    }

    pub fn stay() -> Self {
        Self {
            escalate: false,
            reason: None,
        }
    }
}

/// Thresholds the policy works with.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRules {
    /// Number of most recent customer turns considered for rule 2.
    pub sentiment_window: usize,
    /// Scores strictly below this are negative.
    pub negative_threshold: f64,
    /// Customer turns allowed on an unresolved complaint.
    pub unresolved_attempt_limit: usize,
    /// Lowercase phrases that mean "get me a person".
    pub human_request_phrases: Vec<String>,
}

impl Default for EscalationRules {
    fn default() -> Self {
        Self {
            sentiment_window: 3,
            negative_threshold: -0.4,
            unresolved_attempt_limit: 4,
            human_request_phrases: default_human_request_phrases(),
        }
    }
}

/// Phrases recognised as a request for a human operator.
pub fn default_human_request_phrases() -> Vec<String> {
    [
        "speak to a human",
        "talk to a human",
        "speak to a person",
        "talk to a person",
        "real person",
        "human agent",
        "live agent",
        "customer care agent",
        "speak to someone",
        "talk to someone",
        "speak to an agent",
        "talk to an agent",
        "speak to a manager",
        "nataka kuongea na mtu",
        "mtu halisi",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Rule-ordered escalation policy.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    rules: EscalationRules,
    human_requests: Vec<Phrase>,
}

impl EscalationPolicy {
    pub fn new(rules: EscalationRules) -> Self {
        let human_requests = rules
            .human_request_phrases
            .iter()
            .map(|p| Phrase::new(p))
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            rules,
            human_requests,
        }
    }

    pub fn rules(&self) -> &EscalationRules {
        &self.rules
    }

    /// Evaluates the conversation including its latest customer turn.
    pub fn evaluate(&self, conversation: &Conversation) -> EscalationDecision {
        if self.requests_human(conversation) {
            return EscalationDecision::escalate(EscalationReason::CustomerRequest);
        }
        if self.sentiment_is_sustained_negative(conversation) {
            return EscalationDecision::escalate(EscalationReason::SustainedNegativeSentiment);
        }
        if self.complaint_is_unresolved(conversation) {
            return EscalationDecision::escalate(EscalationReason::UnresolvedComplaint);
        }
        EscalationDecision::stay()
    }

    /// True when `text` contains a human-request phrase as whole words.
    pub fn is_human_request(&self, text: &str) -> bool {
        let text = words(text);
        self.human_requests.iter().any(|p| p.occurs_in(&text))
    }

    fn requests_human(&self, conversation: &Conversation) -> bool {
        conversation
            .latest_customer_turn()
            .map(|t| self.is_human_request(t.text()))
            .unwrap_or(false)
    }

    fn sentiment_is_sustained_negative(&self, conversation: &Conversation) -> bool {
        let window = self.rules.sentiment_window;
        if window == 0 {
            return false;
        }
        let recent = conversation.recent_customer_sentiment(window);
        recent.len() == window
            && recent
                .iter()
                .all(|s| s.is_below(self.rules.negative_threshold))
    }

    fn complaint_is_unresolved(&self, conversation: &Conversation) -> bool {
        conversation.category() == Some(TaskCategory::Complaint)
            && conversation.unresolved_customer_turns() > self.rules.unresolved_attempt_limit
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(EscalationRules::default())
    }
}
