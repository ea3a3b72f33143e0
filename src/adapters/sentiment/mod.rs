//! Sentiment scorer adapters.
//!
//! - `LexiconSentimentScorer` - offline word-list scorer
//! - `ModelSentimentScorer` - asks the language model for a score

mod lexicon_scorer;
mod model_scorer;

pub use lexicon_scorer::LexiconSentimentScorer;
pub use model_scorer::ModelSentimentScorer;
