//! Orchestration configuration
//!
//! Escalation thresholds, conversation lifetime, time budgets and the
//! supported languages.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::OrchestratorSettings;
use crate::domain::escalation::{default_human_request_phrases, EscalationRules};

/// Longest accepted conversation TTL and expiry sweep interval.
pub const MAX_LIFETIME_SECS: u64 = 365 * 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationConfig {
    /// Customer turns looked at for sustained negative sentiment
    #[serde(default = "default_sentiment_window")]
    pub sentiment_window: usize,

    /// Scores strictly below this count as negative
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,

    /// Customer turns allowed on an unresolved complaint
    #[serde(default = "default_unresolved_attempt_limit")]
    pub unresolved_attempt_limit: usize,

    /// Inactivity after which a conversation is closed
    #[serde(default = "default_conversation_ttl")]
    pub conversation_ttl_secs: u64,

    #[serde(default = "default_expiry_sweep_interval")]
    pub expiry_sweep_interval_secs: u64,

    /// Turns of history handed to agents
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    #[serde(default = "default_sentiment_timeout")]
    pub sentiment_timeout_ms: u64,

    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_secs: u64,

    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<String>,

    #[serde(default = "default_language")]
    pub default_language: String,

    /// Replaces the built-in phrase list when set
    pub human_request_phrases: Option<Vec<String>>,
}

impl OrchestrationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.conversation_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_interval_secs)
    }

    pub fn sentiment_timeout(&self) -> Duration {
        Duration::from_millis(self.sentiment_timeout_ms)
    }

    pub fn escalation_rules(&self) -> EscalationRules {
        let phrases = match &self.human_request_phrases {
            Some(phrases) if !phrases.is_empty() => phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            _ => default_human_request_phrases(),
        };
        EscalationRules {
            sentiment_window: self.sentiment_window,
            negative_threshold: self.negative_threshold,
            unresolved_attempt_limit: self.unresolved_attempt_limit,
            human_request_phrases: phrases,
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            max_history_turns: self.max_history_turns,
            sentiment_history_turns: self.sentiment_window.max(1) * 2,
            agent_timeout: Duration::from_secs(self.agent_timeout_secs),
            supported_languages: self.supported_languages.clone(),
            default_language: self.default_language.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sentiment_window == 0 {
            return Err(ValidationError::OutOfRange {
                field: "orchestration.sentiment_window",
                reason: "must be at least 1",
            });
        }
        if !(-1.0..=1.0).contains(&self.negative_threshold) {
            return Err(ValidationError::OutOfRange {
                field: "orchestration.negative_threshold",
                reason: "must be within [-1, 1]",
            });
        }
        if self.unresolved_attempt_limit == 0 {
            return Err(ValidationError::OutOfRange {
                field: "orchestration.unresolved_attempt_limit",
                reason: "must be at least 1",
            });
        }
        if self.conversation_ttl_secs == 0
            || self.expiry_sweep_interval_secs == 0
            || self.sentiment_timeout_ms == 0
            || self.agent_timeout_secs == 0
        {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.conversation_ttl_secs > MAX_LIFETIME_SECS {
            return Err(ValidationError::OutOfRange {
                field: "orchestration.conversation_ttl_secs",
                reason: "must be at most 365 days",
            });
        }
        if self.expiry_sweep_interval_secs > MAX_LIFETIME_SECS {
            return Err(ValidationError::OutOfRange {
                field: "orchestration.expiry_sweep_interval_secs",
                reason: "must be at most 365 days",
            });
        }
        if self.supported_languages.is_empty() {
            return Err(ValidationError::MissingRequired("ORCHESTRATION__SUPPORTED_LANGUAGES"));
        }
        if !self.supported_languages.contains(&self.default_language) {
            return Err(ValidationError::UnsupportedDefaultLanguage(
                self.default_language.clone(),
            ));
        }
        Ok(())
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            sentiment_window: default_sentiment_window(),
            negative_threshold: default_negative_threshold(),
            unresolved_attempt_limit: default_unresolved_attempt_limit(),
            conversation_ttl_secs: default_conversation_ttl(),
            expiry_sweep_interval_secs: default_expiry_sweep_interval(),
            max_history_turns: default_max_history_turns(),
            sentiment_timeout_ms: default_sentiment_timeout(),
            agent_timeout_secs: default_agent_timeout(),
            supported_languages: default_supported_languages(),
            default_language: default_language(),
            human_request_phrases: None,
        }
    }
}

fn default_sentiment_window() -> usize {
    3
}

fn default_negative_threshold() -> f64 {
    -0.4
}

fn default_unresolved_attempt_limit() -> usize {
    4
}

fn default_conversation_ttl() -> u64 {
    86_400
}

fn default_expiry_sweep_interval() -> u64 {
    300
}

fn default_max_history_turns() -> usize {
    10
}

fn default_sentiment_timeout() -> u64 {
    2000
}

fn default_agent_timeout() -> u64 {
    30
}

fn default_supported_languages() -> Vec<String> {
    vec!["en".to_string(), "sw".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_defaults() {
        let config = OrchestrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.escalation_rules(), EscalationRules::default());
        assert_eq!(config.ttl(), Duration::from_secs(86_400));

        let settings = config.orchestrator_settings();
        assert_eq!(settings.max_history_turns, 10);
        assert_eq!(settings.agent_timeout, Duration::from_secs(30));
        assert_eq!(settings.default_language, "en");
    }

    #[test]
    fn test_custom_phrases_are_normalised() {
        let config = OrchestrationConfig {
            human_request_phrases: Some(vec![" Call Me ".to_string(), "".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.escalation_rules().human_request_phrases, vec!["call me"]);
    }

    #[test]
    fn test_default_language_must_be_supported() {
        let config = OrchestrationConfig {
            default_language: "fr".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnsupportedDefaultLanguage("fr".to_string()))
        );
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = OrchestrationConfig {
            negative_threshold: -1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = OrchestrationConfig {
            agent_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        for ttl in [u64::MAX, 10_000_000_000_000, MAX_LIFETIME_SECS + 1] {
            let config = OrchestrationConfig {
                conversation_ttl_secs: ttl,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ValidationError::OutOfRange {
                    field: "orchestration.conversation_ttl_secs",
                    ..
                })
            ));
        }

        let config = OrchestrationConfig {
            expiry_sweep_interval_secs: u64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = OrchestrationConfig {
            conversation_ttl_secs: MAX_LIFETIME_SECS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
