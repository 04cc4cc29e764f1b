use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use gow_agents::TurnRequest;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Build the application router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/gow/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "generation_timeout_secs": state.agent.generation_timeout().as_secs(),
    }))
}

/// One assistant turn. Every well-formed request gets a 200 with a
/// `GowResponse`, including the fallback response when generation fails.
async fn chat(State(state): State<SharedState>, Json(request): Json<TurnRequest>) -> Response {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message must not be empty" })),
        )
            .into_response();
    }

    Json(state.agent.respond(&request).await).into_response()
}
