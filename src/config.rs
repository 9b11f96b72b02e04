use crate::errors::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 8000;

/// Connection settings for the chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the backend, without the `/api/v1` prefix.
    pub api_url: String,
    pub tenant_id: String,
    pub api_token: Option<String>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, tenant_id: impl Into<String>) -> Result<Self, AppError> {
        let api_url = normalize_api_url(&api_url.into())?;
        let tenant_id = tenant_id.into().trim().to_string();
        if tenant_id.is_empty() {
            return Err(AppError::MissingConfig { key: "CONCIERGE_TENANT_ID".to_string() });
        }
        Ok(Self { api_url, tenant_id, api_token: None })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

fn normalize_api_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AppError::InvalidConfig {
            key: "CONCIERGE_API_URL".to_string(),
            message: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(trimmed.to_string())
}
