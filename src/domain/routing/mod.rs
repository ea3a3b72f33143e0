//! Routing module - what a message is about and which task it becomes.

mod category;
mod classifier;
mod phrase;
mod task;

pub use category::TaskCategory;
pub use classifier::{IntentClassifier, RuleBasedIntentClassifier};
pub use phrase::{is_negation, words, Phrase, NEGATIONS};
pub use task::Task;
