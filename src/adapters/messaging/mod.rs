//! Messaging transport adapters.
//!
//! - `LipaChatTransport` - LipaChat platform API
//! - `InMemoryMessagingTransport` - records deliveries for tests

mod in_memory_transport;
mod lipachat_transport;

pub use in_memory_transport::{Delivery, InMemoryMessagingTransport};
pub use lipachat_transport::{LipaChatTransport, LipaChatTransportConfig};
