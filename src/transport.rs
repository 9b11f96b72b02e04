use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Method, StatusCode};

use crate::api::{ensure_success, ApiClient};
use crate::errors::AppError;
use crate::models::ChatRequest;

/// Raw response body of a chat request, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, AppError>>;

/// Opens one streaming chat request against the backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, AppError>;
}

/// `POST /api/v1/chat` over HTTP, reading the chunked body as it arrives.
#[derive(Clone, Debug)]
pub struct HttpChatTransport {
    api: ApiClient,
}

impl HttpChatTransport {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, AppError> {
        let resp = self
            .api
            .request(Method::POST, "/chat")
            .json(request)
            .send()
            .await
            .map_err(AppError::Transport)?;
        let resp = ensure_success(resp)?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Err(AppError::MissingBody);
        }

        let body = resp.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| AppError::stream_read(e.to_string()))
        });
        Ok(body.boxed())
    }
}
