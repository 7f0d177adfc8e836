use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("{service} request failed ({status}): {body}")]
    UpstreamError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Uniform JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_)
            | AppError::CredentialError(_)
            | AppError::UpstreamError { .. }
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_is_400_with_plain_message() {
        let (status, body) = body_of(AppError::BadRequest("message is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "message is required");
    }

    #[tokio::test]
    async fn upstream_error_is_500_and_carries_status_and_body() {
        let (status, body) = body_of(AppError::UpstreamError {
            service: "Retrieval".into(),
            status: 403,
            body: "permission denied".into(),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Retrieval request failed (403): permission denied");
    }

    #[tokio::test]
    async fn configuration_error_is_500() {
        let (status, body) =
            body_of(AppError::ConfigError(anyhow::anyhow!("VERTEX_MODEL is not set"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("VERTEX_MODEL"));
    }
}
