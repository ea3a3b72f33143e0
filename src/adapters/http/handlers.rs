//! HTTP handlers for the webhook and conversation endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

use crate::application::{Orchestrator, OrchestratorError, Outcome};
use crate::domain::foundation::{ConversationId, Timestamp};

use super::dto::{ConversationView, ErrorResponse, HealthResponse, InboundWebhook};
use super::signature::{WebhookError, WebhookVerifier, SIGNATURE_HEADER};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Signature checks are skipped when no secret is configured.
    pub verifier: Option<Arc<WebhookVerifier>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            verifier: None,
        }
    }

    pub fn with_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/lipachat - one inbound customer message.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome>, ApiError> {
    if let Some(verifier) = &state.verifier {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        verifier.verify(signature, &body, chrono::Utc::now().timestamp())?;
    }

    let payload: InboundWebhook = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid payload: {}", e)))?;
    let message = payload
        .into_message(Timestamp::now())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = state.orchestrator.handle_message(message).await?;
    Ok(Json(outcome))
}

/// GET /conversations/:id - current state of a conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let id = parse_id(&id)?;
    let conversation = state
        .orchestrator
        .conversation(&id)
        .await?
        .ok_or(OrchestratorError::NotFound(id))?;
    Ok(Json(ConversationView::from(&conversation)))
}

/// POST /conversations/:id/close - a human operator finished with it.
pub async fn close_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let id = parse_id(&id)?;
    let conversation = state.orchestrator.close_conversation(&id).await?;
    Ok(Json(ConversationView::from(&conversation)))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn parse_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse::<ConversationId>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts failures to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Signature(#[from] WebhookError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self {
            ApiError::Signature(_) => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Orchestrator(OrchestratorError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND")
            }
            ApiError::Orchestrator(OrchestratorError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION")
            }
            ApiError::Orchestrator(OrchestratorError::Storage(_)) => {
                tracing::error!(error = %self, "storage failure while serving request");
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
        };

        (status, Json(ErrorResponse::new(error_code, self.to_string()))).into_response()
    }
}
