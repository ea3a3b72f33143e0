//! Knowledge store adapters.

mod http_vector_store;
mod in_memory_knowledge_base;

pub use http_vector_store::{HttpVectorStore, HttpVectorStoreConfig};
pub use in_memory_knowledge_base::InMemoryKnowledgeBase;
