//! PostgreSQL adapters.
//!
//! - `PostgresConversationStore` - durable conversation store with row-level
//!   locking per conversation key

mod conversation_store;

pub use conversation_store::PostgresConversationStore;
