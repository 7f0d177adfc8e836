//! Provider abstractions for the external collaborators.
//!
//! Retrieval, generation and credentials sit behind traits so the
//! orchestrator can be exercised with fakes (see [`mock`]).

pub mod credentials;
pub mod gemini;
pub mod mock;
pub mod vertex_rag;

use crate::models::{RetrievedContext, Turn};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Access token unavailable: {0}")]
    Credential(String),

    #[error("{service} request failed ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            ProviderError::Credential(msg) => AppError::CredentialError(msg),
            ProviderError::Upstream {
                service,
                status,
                body,
            } => AppError::UpstreamError {
                service: service.to_string(),
                status,
                body,
            },
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Everything the generation model needs for one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Fixed instructions with the numbered context appended.
    pub system_instruction: String,
    /// Prior turns, oldest first.
    pub history: Vec<Turn>,
    /// The current user question.
    pub message: String,
    pub temperature: f32,
}

/// Fetches passages relevant to a query from the knowledge corpus.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>, ProviderError>;
}

/// Produces an answer from instructions, history and the user turn.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Returns the first candidate's text parts concatenated, untrimmed.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

/// Supplies a bearer token for Vertex AI calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// Turn a non-success response into [`ProviderError::Upstream`].
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(service, status = status.as_u16(), "Upstream call failed");

    Err(ProviderError::Upstream {
        service,
        status: status.as_u16(),
        body,
    })
}
