//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - language-model backend used by agent capabilities
//! - `ConversationStore` - durable conversation state (the Context Store)
//! - `SentimentScorer` - per-message sentiment
//! - `KnowledgeStore` - relevance-ranked passages for prompts
//! - `MessagingTransport` - replies to customers, hand-offs to humans

mod ai_provider;
mod conversation_store;
mod knowledge_store;
mod messaging;
mod sentiment_scorer;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, RequestMetadata, TokenUsage,
};
pub use conversation_store::{ConversationStore, StoreError};
pub use knowledge_store::{KnowledgeError, KnowledgeStore};
pub use messaging::{DeliveryAck, MessagingError, MessagingTransport};
pub use sentiment_scorer::{SentimentError, SentimentScorer};
