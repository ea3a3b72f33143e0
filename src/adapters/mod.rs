//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Anthropic Messages API and a scripted mock
//! - `http` - axum webhook and operator endpoints
//! - `knowledge` - in-memory knowledge base and HTTP vector store
//! - `messaging` - LipaChat transport and an in-memory recorder
//! - `postgres` - durable conversation store
//! - `sentiment` - lexicon and model-backed scorers
//! - `storage` - in-memory conversation store

pub mod ai;
pub mod http;
pub mod knowledge;
pub mod messaging;
pub mod postgres;
pub mod sentiment;
pub mod storage;
