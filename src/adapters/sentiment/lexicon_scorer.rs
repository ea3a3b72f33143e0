//! Lexicon-based sentiment scorer.
//!
//! Word valences in English and Kiswahili, with negation, intensifiers and
//! emphasis. A small share of the recent customer mood carries over so one
//! neutral message does not wipe out a frustrated streak.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::conversation::{SentimentScore, Turn};
use crate::domain::foundation::ConversationId;
use crate::domain::routing::is_negation;
use crate::ports::{SentimentError, SentimentScorer};

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        // positive
        ("thanks", 0.6),
        ("thank", 0.6),
        ("great", 0.7),
        ("good", 0.5),
        ("excellent", 0.8),
        ("amazing", 0.8),
        ("awesome", 0.8),
        ("perfect", 0.8),
        ("love", 0.8),
        ("happy", 0.7),
        ("helpful", 0.6),
        ("works", 0.3),
        ("worked", 0.4),
        ("fixed", 0.5),
        ("resolved", 0.5),
        ("easy", 0.4),
        ("fast", 0.3),
        ("asante", 0.6),
        ("nzuri", 0.6),
        ("poa", 0.5),
        ("safi", 0.5),
        ("furaha", 0.7),
        // negative
        ("bad", -0.6),
        ("terrible", -0.9),
        ("awful", -0.9),
        ("horrible", -0.9),
        ("worst", -1.0),
        ("hate", -0.9),
        ("angry", -0.8),
        ("furious", -0.9),
        ("frustrated", -0.7),
        ("frustrating", -0.7),
        ("annoyed", -0.6),
        ("annoying", -0.6),
        ("disappointed", -0.7),
        ("useless", -0.8),
        ("ridiculous", -0.7),
        ("unacceptable", -0.9),
        ("scam", -0.9),
        ("stolen", -0.8),
        ("broken", -0.6),
        ("fail", -0.5),
        ("failed", -0.5),
        ("failing", -0.5),
        ("error", -0.4),
        ("wrong", -0.4),
        ("slow", -0.4),
        ("problem", -0.3),
        ("issue", -0.2),
        ("still", -0.1),
        ("again", -0.2),
        ("mbaya", -0.7),
        ("hasira", -0.8),
        ("tatizo", -0.4),
        ("shida", -0.4),
        ("wizi", -0.8),
        ("umeshindwa", -0.6),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.5),
        ("really", 1.4),
        ("so", 1.3),
        ("extremely", 1.8),
        ("totally", 1.5),
        ("completely", 1.5),
        ("absolutely", 1.6),
        ("sana", 1.5),
        ("kabisa", 1.5),
    ]
    .into_iter()
    .collect()
});

/// How many tokens a negation or intensifier reaches forward.
const MODIFIER_REACH: usize = 3;
const NEGATION_FACTOR: f64 = -0.75;
const CAPS_FACTOR: f64 = 1.25;
/// Normalisation constant for `sum / sqrt(sum² + alpha)`.
const ALPHA: f64 = 1.0;

/// Deterministic scorer over a fixed word list.
#[derive(Debug, Clone)]
pub struct LexiconSentimentScorer {
    carry_over: f64,
    history_window: usize,
}

impl LexiconSentimentScorer {
    pub fn new() -> Self {
        Self {
            carry_over: 0.2,
            history_window: 3,
        }
    }

    /// Valence of `text` alone in `[-1, 1]`.
    pub fn valence(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let mut sum = 0.0;

        for (i, (word, shouted)) in tokens.iter().enumerate() {
            let Some(&base) = LEXICON.get(word.as_str()) else {
                continue;
            };

            let mut value = base;
            if *shouted {
                value *= CAPS_FACTOR;
            }

            let window = &tokens[i.saturating_sub(MODIFIER_REACH)..i];
            for (previous, _) in window {
                if let Some(&boost) = INTENSIFIERS.get(previous.as_str()) {
                    value *= boost;
                }
            }
            // Kiswahili intensifiers follow the word ("mbaya sana").
            if let Some((next, _)) = tokens.get(i + 1) {
                if let Some(&boost) = INTENSIFIERS.get(next.as_str()) {
                    value *= boost;
                }
            }
            if window.iter().any(|(w, _)| is_negation(w)) {
                value *= NEGATION_FACTOR;
            }

            sum += value;
        }

        if sum != 0.0 {
            let exclamations = text.matches('!').count().min(3) as f64;
            sum *= 1.0 + 0.1 * exclamations;
        }

        (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    fn prior(&self, recent_turns: &[Turn]) -> Option<f64> {
        let scores: Vec<f64> = recent_turns
            .iter()
            .rev()
            .filter(|t| t.is_customer())
            .filter_map(|t| t.sentiment())
            .take(self.history_window)
            .map(|s| s.value())
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

impl Default for LexiconSentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentScorer for LexiconSentimentScorer {
    async fn score(
        &self,
        _conversation_id: &ConversationId,
        text: &str,
        recent_turns: &[Turn],
    ) -> Result<SentimentScore, SentimentError> {
        let current = self.valence(text);
        let blended = match self.prior(recent_turns) {
            Some(prior) => (1.0 - self.carry_over) * current + self.carry_over * prior,
            None => current,
        };
        Ok(SentimentScore::clamped(blended))
    }
}

/// Lowercased words with a flag for words written in capitals.
fn tokenize(text: &str) -> Vec<(String, bool)> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| {
            let letters: Vec<char> = w.chars().filter(|c| c.is_alphabetic()).collect();
            let shouted = letters.len() > 2 && letters.iter().all(|c| c.is_uppercase());
            (w.to_lowercase(), shouted)
        })
        .collect()
}
