//! Widget session API — the thin adapter surface rendering clients drive.
//!
//! Every client (component-based or plain-DOM) talks to the same
//! session-scoped endpoints; the flow engine, selection handling, and
//! composer all run here so no client duplicates the state machine.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::api::AppState;
use crate::compose;
use crate::flow::engine::Dispatch;
use crate::proxy::ChatRequest;
use crate::selection;
use crate::session::Message;
use crate::tags::{self, ComponentRegistry};

/// Build the widget session routes.
pub fn widget_routes(state: AppState) -> Router {
    Router::new()
        .route("/widget/session", post(create_session))
        .route("/widget/session/{id}", get(get_session))
        .route("/widget/session/{id}/message", post(post_message))
        .route("/widget/session/{id}/selection", post(post_selection))
        .route("/widget/session/{id}/compose", post(compose_message))
        .with_state(state)
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: String,
    messages: Vec<Message>,
}

/// Turns appended to the log by one request, in order.
#[derive(Serialize)]
struct TurnsResponse {
    messages: Vec<Message>,
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Unknown session" })),
    )
        .into_response()
}

/// POST /widget/session — create a session seeded with the greeting turn.
async fn create_session(State(state): State<AppState>) -> Response {
    let greeting = Message::assistant(state.table.greeting_content());
    let id = state.sessions.create(vec![greeting.clone()]).await;
    info!(session_id = %id, "Widget session created");
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: id,
            messages: vec![greeting],
        }),
    )
        .into_response()
}

/// Serialize a turn with its rendering resolved: recognized trailing tags
/// are stripped from the display text and reported separately, so thin
/// clients need no tag parsing of their own.
fn rendered_turn(registry: &ComponentRegistry, message: &Message) -> Value {
    let mut turn = json!(message);
    if let Some(tag) = tags::extract_tag(&message.content) {
        if registry.get(&tag).is_some() {
            turn["text"] = Value::String(tags::strip_tag(&message.content, &tag));
            turn["tag"] = Value::String(tag);
        }
    }
    turn
}

/// GET /widget/session/{id} — full session snapshot.
async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let snapshot = state
        .sessions
        .with(&id, |session| {
            let messages: Vec<Value> = session
                .log
                .iter()
                .map(|m| rendered_turn(&state.registry, m))
                .collect();
            json!({
                "session_id": session.id,
                "selections": session.selections,
                "flow": session.cursor,
                "messages": messages,
            })
        })
        .await;
    match snapshot {
        Some(body) => Json(body).into_response(),
        None => session_not_found(),
    }
}

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
}

/// POST /widget/session/{id}/message — free-text input.
///
/// The flow engine gets first pick: trigger entry, continue-prefix advance,
/// or abandonment. Unhandled text is forwarded to the backend, and a proxy
/// failure becomes a synthetic Assistant error turn, never a dropped one.
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Response {
    let text = body.text.trim().to_string();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Message text is required" })),
        )
            .into_response();
    }

    // Local flow handling under the session lock.
    let local = state
        .sessions
        .update(&id, |session| {
            let mut turns = vec![Message::user(text.clone())];
            let dispatch = session.cursor.dispatch(&state.table, &text);
            let forward = matches!(dispatch, Dispatch::Forward);
            if let Dispatch::Emitted(contents) = dispatch {
                turns.extend(contents.into_iter().map(Message::assistant));
            }
            session.log.extend(turns.iter().cloned());
            (turns, forward, session.selections.clone())
        })
        .await;
    let Some((mut turns, forward, selections)) = local else {
        return session_not_found();
    };

    if forward {
        let request = ChatRequest {
            query: text,
            session_id: Some(id.clone()),
            selections: Some(Value::Object(selections)),
            ..ChatRequest::default()
        };
        let reply = match state.upstream.chat(&request).await {
            Ok(reply) => {
                let answer = reply
                    .body
                    .get("answer")
                    .and_then(Value::as_str)
                    .unwrap_or("No answer")
                    .to_string();
                Message::assistant_with_details(answer, reply.body)
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Chat proxy failed for widget session");
                Message::assistant_with_details(
                    format!("Error contacting backend: {e}"),
                    json!({ "error": e.to_string() }),
                )
            }
        };
        // The session may have moved on while the call was in flight; the
        // response is still appended as the next turn.
        let appended = state
            .sessions
            .update(&id, |session| session.log.push(reply.clone()))
            .await;
        if appended.is_none() {
            return session_not_found();
        }
        turns.push(reply);
    }

    Json(TurnsResponse { messages: turns }).into_response()
}

/// POST /widget/session/{id}/selection — a selection event, e.g.
/// `{"channels": "slack"}`.
///
/// Appends the paraphrased User turn and canned acknowledgment, merges the
/// selection, and advances the active flow. A what-chatbot choice enters
/// its associated flow first.
async fn post_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Map<String, Value>>,
) -> Response {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Selection payload is required" })),
        )
            .into_response();
    }

    let turns = state
        .sessions
        .update(&id, |session| {
            let mut turns: Vec<Message> = Vec::new();

            if let Some(flow_id) = body.iter().find_map(|(key, value)| {
                value
                    .as_str()
                    .and_then(|v| state.registry.flow_for_selection(key, v))
            }) {
                let flow_id = flow_id.to_string();
                turns.extend(
                    session
                        .cursor
                        .enter(&state.table, &flow_id)
                        .into_iter()
                        .map(Message::assistant),
                );
            }

            turns.push(Message::user(selection::selection_message(&body)));
            for (key, value) in &body {
                session.record_selection(key, value.clone());
            }
            turns.push(Message::assistant(selection::acknowledgment(&body)));

            if !session.cursor.is_idle() {
                turns.extend(
                    session
                        .cursor
                        .advance(&state.table)
                        .into_iter()
                        .map(Message::assistant),
                );
            }

            session.log.extend(turns.iter().cloned());
            turns
        })
        .await;

    match turns {
        Some(messages) => Json(TurnsResponse { messages }).into_response(),
        None => session_not_found(),
    }
}

/// POST /widget/session/{id}/compose — generate the outreach message from
/// the accumulated selections. When the current step carries a message
/// template, its interpolation is returned alongside.
async fn compose_message(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let snapshot = state
        .sessions
        .with(&id, |session| {
            (
                session.selections.clone(),
                session.cursor.composer_flow().map(str::to_string),
                session.cursor.active.clone(),
                session.cursor.step,
            )
        })
        .await;
    let Some((selections, composer_flow, active, step)) = snapshot else {
        return session_not_found();
    };

    let message = compose::outreach_message(&selections, composer_flow.as_deref());
    let mut body = json!({ "message": message });

    if let Some(template) = active
        .as_deref()
        .and_then(|flow_id| state.table.get(flow_id))
        .and_then(|flow| flow.sequence.get(step))
        .and_then(|s| s.message_template.as_ref())
    {
        body["template_message"] = Value::String(compose::fill_template(template, &selections));
    }

    Json(body).into_response()
}
