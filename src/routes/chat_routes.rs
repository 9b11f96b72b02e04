use std::convert::Infallible;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ChatRequest, HealthStatus, StreamEvent, MAX_MESSAGE_LENGTH};
use crate::stream::{encode_event, word_tokens};

/// Apology streamed before an `error` event, as the production backend does.
const GENERATION_FAILED_REPLY: &str = "I apologize, but I'm having trouble responding right now. \
                                       Please try again or contact the spa directly for assistance.";

/// Message prefixes that make the dev backend misbehave on purpose.
const FAIL_COMMAND: &str = "/fail";
const CUTOFF_COMMAND: &str = "/cutoff";

/// GET `/health`
pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus { status: "healthy".to_string() })
}

/// POST `/api/v1/chat` — streams an echo of the message as `data:` events.
///
/// `/fail ...` ends with an apology token plus an `error` event; `/cutoff ...`
/// closes the body before `done`.
pub async fn chat_handler(Json(body): Json<ChatRequest>) -> Response {
    let Some(tenant_id) = body.tenant_id.as_deref().filter(|t| !t.trim().is_empty()) else {
        return detail(StatusCode::BAD_REQUEST, "tenant_id is required");
    };
    let length = body.message.chars().count();
    if body.message.trim().is_empty() || length > MAX_MESSAGE_LENGTH {
        return detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("message must be between 1 and {MAX_MESSAGE_LENGTH} characters"),
        );
    }

    let conversation_id = resolve_conversation_id(body.conversation_id.as_deref());
    info!("Dev chat turn for tenant {tenant_id}, conversation {conversation_id}");

    let events = script_reply(&body.message, &conversation_id);
    let frames: Vec<Result<String, Infallible>> = events
        .iter()
        .filter_map(|event| match encode_event(event) {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                error!("Failed to encode stream event {event:?}: {e}");
                None
            }
        })
        .collect();

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream::iter(frames)),
    )
        .into_response()
}

/// Reuses a well-formed client id, otherwise starts a new conversation.
fn resolve_conversation_id(requested: Option<&str>) -> String {
    requested
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string()
}

fn script_reply(message: &str, conversation_id: &str) -> Vec<StreamEvent> {
    let message = message.trim();
    if message.starts_with(FAIL_COMMAND) {
        return vec![
            StreamEvent::token(GENERATION_FAILED_REPLY),
            StreamEvent::Error { conversation_id: Some(conversation_id.to_string()) },
        ];
    }

    let (reply, finish) = match message.strip_prefix(CUTOFF_COMMAND) {
        Some(rest) => (format!("You said: {}", rest.trim()), false),
        None => (format!("You said: {message}"), true),
    };

    let mut events: Vec<StreamEvent> =
        word_tokens(&reply).into_iter().map(StreamEvent::token).collect();
    if finish {
        events.push(StreamEvent::Done {
            conversation_id: Some(conversation_id.to_string()),
            lead_id: None,
            escalated: false,
        });
    }
    events
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}
