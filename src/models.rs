use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Backend limit on a single chat message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalised chat turn. Content never changes once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into())
    }
}

/// Body of `POST /api/v1/chat`. `conversation_id` is sent as `null` on the first turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// One `data:` payload of the chat stream (internally tagged on `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token {
        content: String,
    },
    /// Metadata fields are read leniently: a null or mistyped value never
    /// costs the terminal event itself.
    Done {
        #[serde(default, deserialize_with = "lenient_string")]
        conversation_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        lead_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_bool")]
        escalated: bool,
    },
    Error {
        #[serde(default, deserialize_with = "lenient_string")]
        conversation_id: Option<String>,
    },
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    pub fn token(content: impl Into<String>) -> Self {
        StreamEvent::Token { content: content.into() }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// The conversation id carried by a terminal event, ignoring empty strings.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Done { conversation_id, .. } | StreamEvent::Error { conversation_id } => {
                conversation_id.as_deref().filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }
}

/// Strings pass through, numbers are stringified, anything else is absent.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Server health report from `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
