//! Transport from the chat surface to the RAG chat service.

use async_trait::async_trait;
use reqwest::Client;
use service_core::contracts::{ChatRequest, ChatResponse};
use service_core::error::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request aborted by user")]
    Aborted,

    #[error("network error: {0}")]
    Network(String),

    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Sends one chat request and waits for the answer.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;
}

/// Talks to `POST {base_url}/api/chat`.
pub struct HttpChatBackend {
    client: Client,
    chat_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("Request failed: {}", status));

            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
