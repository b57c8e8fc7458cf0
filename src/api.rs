//! REST endpoints: backend proxy, flow table, component definitions, lead
//! intake, and the probe status surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::flow::table::FlowTable;
use crate::probe::ProbeStatus;
use crate::proxy::{ChatRequest, Upstream};
use crate::session::SessionStore;
use crate::tags::ComponentRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<FlowTable>,
    pub registry: Arc<ComponentRegistry>,
    pub sessions: Arc<SessionStore>,
    pub upstream: Upstream,
    pub probe: watch::Receiver<ProbeStatus>,
}

/// Build the proxy/meta REST routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/flows", get(flows))
        .route("/components", get(list_components))
        .route("/components/{tag}", get(component_def))
        .route("/send-message", post(send_message))
        .with_state(state)
}

// ── Meta ────────────────────────────────────────────────────────────────

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": "chatbot-widget",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
        "backend": state.upstream.base(),
    }))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let latest = state.probe.borrow().clone();
    Json(latest)
}

// ── Proxy ───────────────────────────────────────────────────────────────

/// POST /chat — forward the query upstream, relaying the JSON verbatim.
/// Any failure becomes the fixed error envelope with HTTP 500.
async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> impl IntoResponse {
    match state.upstream.chat(&body).await {
        Ok(reply) => (
            StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(reply.body),
        ),
        Err(e) => {
            warn!(error = %e, "Chat proxy failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Upstream::chat_error_body(&e)),
            )
        }
    }
}

/// GET /health — pass through the backend's status JSON.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.upstream.health().await {
        Ok(reply) => (
            StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(reply.body),
        ),
        Err(e) => {
            warn!(error = %e, "Health proxy failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Upstream::health_error_body(&e)),
            )
        }
    }
}

// ── Flow table + components ─────────────────────────────────────────────

async fn flows(State(state): State<AppState>) -> impl IntoResponse {
    Json((*state.table).clone())
}

async fn list_components(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "supported": state.registry.tags() }))
}

async fn component_def(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&tag) {
        Some(component) => (StatusCode::OK, Json(serde_json::json!(component))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Unknown component" })),
        ),
    }
}

// ── Lead intake ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    message: String,
}

/// POST /send-message — validate and record a lead message.
///
/// Delivery is a deliberate stub: the lead is logged so it is not lost,
/// but no email goes out.
async fn send_message(Json(body): Json<SendMessageRequest>) -> impl IntoResponse {
    if body.name.is_empty() || body.email.is_empty() || body.message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing required fields: name, email, and message are required"
            })),
        );
    }

    info!(
        name = %body.name,
        email = %body.email,
        company = %body.company,
        message = %body.message,
        timestamp = %Utc::now().to_rfc3339(),
        "New lead message"
    );

    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Message sent successfully" })),
    )
}
