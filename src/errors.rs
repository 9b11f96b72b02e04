use thiserror::Error;

/// Top-level error type for the concierge client and its dev backend.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Failed to reach chat backend: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API error: {status} {reason}")]
    Api { status: u16, reason: String },

    #[error("Chat response carried no streamable body")]
    MissingBody,

    #[error("Stream read failed: {message}")]
    StreamRead { message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── Session errors ───────────────────────────────────────────────────────
    #[error("A message is already being sent for this conversation")]
    SendInFlight,

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Missing configuration value '{key}'")]
    MissingConfig { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn stream_read(message: impl Into<String>) -> Self {
        AppError::StreamRead { message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. } | AppError::FieldTooLong { .. })
    }

    /// Failures of the connection or response body. Anything else reaching the
    /// client's fallback path is logged as unexpected.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_)
                | AppError::Api { .. }
                | AppError::MissingBody
                | AppError::StreamRead { .. }
                | AppError::Decode(_)
        )
    }
}
