//! Sentiment scores and the per-conversation trend.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Sentiment of a single message in `[-1.0, 1.0]`.
///
/// Negative values are unhappy, positive values are happy, `0.0` is neutral.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SentimentScore(f64);

impl SentimentScore {
    pub const MIN: f64 = -1.0;
    pub const MAX: f64 = 1.0;

    /// Creates a score, rejecting values outside `[-1.0, 1.0]` and NaN.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValidationError::out_of_range(
                "sentiment",
                Self::MIN,
                Self::MAX,
                value,
            ));
        }
        Ok(Self(value))
    }

    /// Creates a score, clamping into range. NaN becomes neutral.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::neutral();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn neutral() -> Self {
        Self(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// True when strictly below the threshold.
    pub fn is_below(&self, threshold: f64) -> bool {
        self.0 < threshold
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::neutral()
    }
}

impl TryFrom<f64> for SentimentScore {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SentimentScore> for f64 {
    fn from(score: SentimentScore) -> Self {
        score.0
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Ordered scores of a conversation's customer turns, oldest first.
///
/// Only turns that actually received a score contribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentTrend(Vec<SentimentScore>);

impl SentimentTrend {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, score: SentimentScore) {
        self.0.push(score);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn scores(&self) -> &[SentimentScore] {
        &self.0
    }

    /// The most recent `n` scores (fewer if the trend is shorter).
    pub fn recent(&self, n: usize) -> &[SentimentScore] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }

    pub fn latest(&self) -> Option<SentimentScore> {
        self.0.last().copied()
    }

    /// Mean of the most recent `n` scores, `None` when empty.
    pub fn recent_average(&self, n: usize) -> Option<f64> {
        let recent = self.recent(n);
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().map(SentimentScore::value).sum::<f64>() / recent.len() as f64)
    }
}

impl From<Vec<SentimentScore>> for SentimentTrend {
    fn from(scores: Vec<SentimentScore>) -> Self {
        Self(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: f64) -> SentimentScore {
        SentimentScore::new(v).unwrap()
    }

    #[test]
    fn score_rejects_out_of_range() {
        assert!(SentimentScore::new(1.01).is_err());
        assert!(SentimentScore::new(-1.5).is_err());
        assert!(SentimentScore::new(f64::NAN).is_err());
    }

    #[test]
    fn score_accepts_bounds() {
        assert_eq!(score(-1.0).value(), -1.0);
        assert_eq!(score(1.0).value(), 1.0);
    }

    #[test]
    fn clamped_forces_into_range() {
        assert_eq!(SentimentScore::clamped(4.0).value(), 1.0);
        assert_eq!(SentimentScore::clamped(-4.0).value(), -1.0);
        assert_eq!(SentimentScore::clamped(f64::NAN), SentimentScore::neutral());
    }

    #[test]
    fn is_below_is_strict() {
        assert!(score(-0.5).is_below(-0.4));
        assert!(!score(-0.4).is_below(-0.4));
    }

    #[test]
    fn deserializing_out_of_range_fails() {
        assert!(serde_json::from_str::<SentimentScore>("2.0").is_err());
        assert_eq!(serde_json::from_str::<SentimentScore>("-0.25").unwrap().value(), -0.25);
    }

    #[test]
    fn trend_recent_returns_tail() {
        let trend = SentimentTrend::from(vec![score(0.1), score(-0.2), score(-0.6)]);
        assert_eq!(trend.recent(2), &[score(-0.2), score(-0.6)]);
        assert_eq!(trend.recent(10).len(), 3);
        assert_eq!(trend.latest(), Some(score(-0.6)));
    }

    #[test]
    fn trend_recent_average() {
        let trend = SentimentTrend::from(vec![score(0.5), score(-0.5), score(-1.0)]);
        assert_eq!(trend.recent_average(2), Some(-0.75));
        assert_eq!(SentimentTrend::new().recent_average(3), None);
    }
}
