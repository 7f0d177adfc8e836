use crate::config::SOURCE_MODE;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::contracts::HealthResponse;

/// Reports the connection parameters the service is running with.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let vertex = &state.config.vertex;

    Json(HealthResponse {
        ok: true,
        source_mode: SOURCE_MODE.to_string(),
        model: vertex.model.clone(),
        project: vertex.project.clone(),
        location: vertex.location.clone(),
        corpus: vertex.corpus.clone(),
        top_k: state.orchestrator.top_k(),
    })
}
