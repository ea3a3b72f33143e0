//! Turns - the individual messages of a conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, TurnId};
use crate::domain::routing::TaskCategory;

use super::SentimentScore;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Customer,
    Agent,
    System,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Customer => "customer",
            Speaker::Agent => "agent",
            Speaker::System => "system",
        }
    }
}

impl std::str::FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Speaker::Customer),
            "agent" => Ok(Speaker::Agent),
            "system" => Ok(Speaker::System),
            other => Err(format!("unknown speaker '{}'", other)),
        }
    }
}

/// Which agent capability produced an agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Support,
    Marketing,
    General,
    /// Reply produced after the resolved capability failed.
    Fallback,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Support => "support",
            AgentKind::Marketing => "marketing",
            AgentKind::General => "general",
            AgentKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "support" => Ok(AgentKind::Support),
            "marketing" => Ok(AgentKind::Marketing),
            "general" => Ok(AgentKind::General),
            "fallback" => Ok(AgentKind::Fallback),
            other => Err(format!("unknown agent kind '{}'", other)),
        }
    }
}

/// Bookkeeping markers carried by system turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMarker {
    /// The customer confirmed their issue is resolved.
    Resolved,
    /// The conversation was handed to a human.
    HandedOff,
}

/// One message within a conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    speaker: Speaker,
    text: String,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent_kind: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentiment: Option<SentimentScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<TaskCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marker: Option<TurnMarker>,
}

impl Turn {
    /// A customer message. `sentiment` is `None` when scoring was unavailable.
    pub fn customer(
        text: impl Into<String>,
        timestamp: Timestamp,
        sentiment: Option<SentimentScore>,
        category: TaskCategory,
    ) -> Self {
        Self {
            id: TurnId::new(),
            speaker: Speaker::Customer,
            text: text.into(),
            timestamp,
            agent_kind: None,
            sentiment,
            category: Some(category),
            marker: None,
        }
    }

    /// A reply produced by an agent capability.
    pub fn agent(text: impl Into<String>, timestamp: Timestamp, kind: AgentKind) -> Self {
        Self {
            id: TurnId::new(),
            speaker: Speaker::Agent,
            text: text.into(),
            timestamp,
            agent_kind: Some(kind),
            sentiment: None,
            category: None,
            marker: None,
        }
    }

    /// A system note, optionally carrying a marker.
    pub fn system(text: impl Into<String>, timestamp: Timestamp, marker: Option<TurnMarker>) -> Self {
        Self {
            id: TurnId::new(),
            speaker: Speaker::System,
            text: text.into(),
            timestamp,
            agent_kind: None,
            sentiment: None,
            category: None,
            marker,
        }
    }

    /// Reconstitutes a turn from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TurnId,
        speaker: Speaker,
        text: String,
        timestamp: Timestamp,
        agent_kind: Option<AgentKind>,
        sentiment: Option<SentimentScore>,
        category: Option<TaskCategory>,
        marker: Option<TurnMarker>,
    ) -> Self {
        Self {
            id,
            speaker,
            text,
            timestamp,
            agent_kind,
            sentiment,
            category,
            marker,
        }
    }

    pub fn id(&self) -> &TurnId {
        &self.id
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn agent_kind(&self) -> Option<AgentKind> {
        self.agent_kind
    }

    pub fn sentiment(&self) -> Option<SentimentScore> {
        self.sentiment
    }

    pub fn category(&self) -> Option<TaskCategory> {
        self.category
    }

    pub fn marker(&self) -> Option<TurnMarker> {
        self.marker
    }

    pub fn is_customer(&self) -> bool {
        self.speaker == Speaker::Customer
    }

    pub fn is_resolution_marker(&self) -> bool {
        self.marker == Some(TurnMarker::Resolved)
    }
}
