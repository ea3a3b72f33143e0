//! Axum router for the inbound HTTP surface.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{close_conversation, get_conversation, health, receive_webhook, AppState};

/// `POST /lipachat` - signed inbound messages.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/lipachat", post(receive_webhook))
}

/// Operator endpoints:
/// - `GET /:id` - conversation view
/// - `POST /:id/close` - close an escalated conversation
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_conversation))
        .route("/:id/close", post(close_conversation))
}

/// Complete router with tracing and a per-request timeout.
pub fn api_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .nest("/conversations", conversation_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::http::{WebhookVerifier, SIGNATURE_HEADER};
    use crate::adapters::knowledge::InMemoryKnowledgeBase;
    use crate::adapters::messaging::InMemoryMessagingTransport;
    use crate::adapters::sentiment::LexiconSentimentScorer;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::application::{Collaborators, Orchestrator, OrchestratorSettings, SentimentMonitor};
    use crate::domain::agents::{AgentRegistry, GeneralAgent, ModelSettings, SupportAgent};
    use crate::domain::escalation::EscalationPolicy;
    use crate::domain::knowledge::{KnowledgeRetriever, RetrievalSettings};
    use crate::domain::routing::RuleBasedIntentClassifier;

    const SECRET: &str = "whsec_routes";

    fn state() -> AppState {
        let provider = Arc::new(MockAIProvider::new().with_fallback_content("Happy to help!"));
        let registry = AgentRegistry::new(Arc::new(GeneralAgent::new(
            provider.clone(),
            ModelSettings::default(),
        )))
        .with(Arc::new(SupportAgent::new(provider, ModelSettings::default())));

        let orchestrator = Orchestrator::new(
            Collaborators {
                store: Arc::new(InMemoryConversationStore::new()),
                transport: Arc::new(InMemoryMessagingTransport::new()),
                classifier: Arc::new(RuleBasedIntentClassifier::new()),
                sentiment: SentimentMonitor::new(
                    Arc::new(LexiconSentimentScorer::new()),
                    Duration::from_secs(1),
                ),
                policy: EscalationPolicy::default(),
                registry,
                retriever: KnowledgeRetriever::new(
                    Arc::new(InMemoryKnowledgeBase::seeded()),
                    RetrievalSettings::default(),
                ),
            },
            OrchestratorSettings::default(),
        );
        AppState::new(Arc::new(orchestrator)).with_verifier(WebhookVerifier::new(SECRET, 300))
    }

    fn signed_webhook(body: &str) -> Request<Body> {
        let signature = WebhookVerifier::new(SECRET, 300)
            .sign(body.as_bytes(), chrono::Utc::now().timestamp());
        Request::builder()
            .method("POST")
            .uri("/webhooks/lipachat")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app(state: AppState) -> Router {
        api_router(state, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn signed_webhook_gets_a_reply() {
        let body = r#"{"customer_id": "+254700000101", "channel": "whatsapp", "text": "How do I reset my password?"}"#;
        let response = app(state()).oneshot(signed_webhook(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let outcome = json(response).await;
        assert_eq!(outcome["type"], "reply");
        assert_eq!(outcome["payload"]["text"], "Happy to help!");
    }

    #[tokio::test]
    async fn unsigned_webhook_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/lipachat")
            .body(Body::from(r#"{"customer_id": "c", "channel": "web", "text": "hi"}"#))
            .unwrap();
        let response = app(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["error_code"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_request() {
        let response = app(state())
            .oneshot(signed_webhook(r#"{"customer_id": "c"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn conversation_view_and_close() {
        let state = state();
        let body = r#"{"customer_id": "+254700000102", "channel": "sms", "text": "I want to speak to a human"}"#;
        let response = app(state.clone()).oneshot(signed_webhook(body)).await.unwrap();
        assert_eq!(json(response).await["type"], "escalation");

        let response = app(state.clone())
            .oneshot(
                Request::get("/conversations/sms:+254700000102")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json(response).await;
        assert_eq!(view["status"], "escalated");
        assert_eq!(view["ticket"]["reason"], "CustomerRequest");

        let close = || {
            Request::post("/conversations/sms:+254700000102/close")
                .body(Body::empty())
                .unwrap()
        };
        let response = app(state.clone()).oneshot(close()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "closed");

        let response = app(state).oneshot(close()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let response = app(state())
            .oneshot(Request::get("/conversations/web:nobody").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app(state())
            .oneshot(Request::get("/conversations/no-separator").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
