use axum::Json;
use service_core::contracts::ReindexResponse;

pub const REINDEX_MESSAGE: &str = "Indexing is managed by the Vertex AI RAG corpus. \
Import new documents into the corpus; there is no local index to rebuild.";

/// Informational only; the corpus is maintained outside this service.
pub async fn reindex() -> Json<ReindexResponse> {
    Json(ReindexResponse {
        ok: true,
        message: REINDEX_MESSAGE.to_string(),
    })
}
