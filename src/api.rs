use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::errors::AppError;
use crate::models::HealthStatus;

/// Path prefix of every versioned backend route.
pub const API_PREFIX: &str = "/api/v1";

/// Thin JSON wrapper over the backend REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an authenticated request against `/api/v1{path}`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{API_PREFIX}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send_json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send_json(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.send_json(self.request(Method::DELETE, path)).await
    }

    /// `GET /health`, which lives outside the versioned prefix.
    pub async fn health(&self) -> Result<HealthStatus, AppError> {
        let builder = self.http.get(format!("{}/health", self.base_url));
        self.send_json(builder).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let resp = ensure_success(builder.send().await.map_err(AppError::Transport)?)?;
        resp.json::<T>().await.map_err(AppError::Decode)
    }
}

/// Maps a non-2xx response to [`AppError::Api`].
pub fn ensure_success(resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Api {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }
    Ok(resp)
}
