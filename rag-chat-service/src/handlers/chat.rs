use crate::models::{ChatRequest, ChatResponse};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;

/// `POST /api/chat`: answer one question given the prior turns.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    tracing::info!(
        message_len = request.message.len(),
        history_len = request.history.len(),
        "Chat request"
    );

    let response = state
        .orchestrator
        .handle(&request.message, &request.history)
        .await?;

    Ok(Json(response))
}
