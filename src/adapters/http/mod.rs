//! Inbound HTTP surface.
//!
//! - `POST /webhooks/lipachat` - signed customer messages
//! - `GET /conversations/:id` - conversation view
//! - `POST /conversations/:id/close` - operator closes a conversation
//! - `GET /health`

pub mod dto;
pub mod handlers;
pub mod routes;
mod signature;

pub use handlers::{ApiError, AppState};
pub use routes::api_router;
pub use signature::{SignatureHeader, WebhookError, WebhookVerifier, SIGNATURE_HEADER};
