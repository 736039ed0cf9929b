//! REST endpoints for the intake chat.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::IntakeError;

use super::model::{TurnRequest, TurnResponse};
use super::orchestrator::IntakeOrchestrator;

/// Header names are case-insensitive; `http` stores them lowercase.
const SESSION_HEADER: &str = "session-id";

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub orchestrator: Arc<IntakeOrchestrator>,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = match &self {
            IntakeError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            IntakeError::InvalidModelOutput(_) | IntakeError::MissingField(_) => {
                StatusCode::BAD_GATEWAY
            }
            IntakeError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        warn!(kind = self.kind(), error = %self, "Intake request failed");
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "retryable": self.is_retryable(),
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "commute-intake"
    }))
}

/// GET /chatbot/start
async fn start_chat(State(state): State<IntakeRouteState>) -> Json<TurnResponse> {
    Json(state.orchestrator.start_chat())
}

/// POST /chatbot
///
/// Runs one turn. The `Session-ID` header is optional and only logged.
async fn create_chat(
    State(state): State<IntakeRouteState>,
    headers: HeaderMap,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, IntakeError> {
    tracing::debug!(session_id = session_id(&headers).unwrap_or("-"), "Chat turn received");
    state.orchestrator.process_turn(request).await.map(Json)
}

/// GET /chatbot?sessionId=
async fn get_chat(
    State(state): State<IntakeRouteState>,
    Query(query): Query<SessionQuery>,
) -> Json<TurnResponse> {
    Json(state.orchestrator.get_chat_by_session_id(&query.session_id))
}

/// POST /chatbot/address
///
/// Returns a plain-text confirmation. Requires the `Session-ID` header.
async fn check_address(
    State(state): State<IntakeRouteState>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<String, IntakeError> {
    let session = session_id(&headers).ok_or_else(|| {
        IntakeError::MalformedInput("Session-ID header is required".to_string())
    })?;
    state.orchestrator.verify_address(&payload, session)
}

/// Build the intake REST routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chatbot/start", get(start_chat))
        .route("/chatbot", post(create_chat).get(get_chat))
        .route("/chatbot/address", post(check_address))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
