//! Vertex AI RAG Engine retrieval.
//!
//! Calls `retrieveContexts` against a single corpus. Ranking happens
//! entirely on the Vertex side; passages come back in its order.

use super::{ensure_success, ContextRetriever, ProviderError, TokenSource};
use crate::config::VertexConfig;
use crate::models::RetrievedContext;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Retriever backed by a Vertex AI RAG corpus.
pub struct VertexRagRetriever {
    config: VertexConfig,
    client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl VertexRagRetriever {
    pub fn new(config: VertexConfig, client: Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }
}

#[async_trait]
impl ContextRetriever for VertexRagRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>, ProviderError> {
        self.config.validate()?;
        let project = self.config.project()?;
        let location = self.config.location()?;
        let corpus = self.config.corpus_resource()?;
        let token = self.tokens.access_token().await?;

        let url = format!(
            "{}/v1/projects/{}/locations/{}:retrieveContexts",
            self.config.endpoint_root(location),
            project,
            location
        );

        let request = RetrieveContextsRequest {
            vertex_rag_store: VertexRagStore {
                rag_resources: vec![RagResource { rag_corpus: corpus }],
            },
            query: RagQuery {
                text: query.to_string(),
                rag_retrieval_config: RagRetrievalConfig { top_k },
            },
        };

        tracing::debug!(location, top_k, query_len = query.len(), "Retrieving contexts");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = ensure_success("Retrieval", response).await?;

        let body: RetrieveContextsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("retrieveContexts: {}", e)))?;

        let contexts: Vec<RetrievedContext> = body
            .contexts
            .contexts
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .map(|c| RetrievedContext::new(c.text, c.source_uri))
            .collect();

        tracing::debug!(count = contexts.len(), "Retrieved contexts");

        Ok(contexts)
    }
}

// ============================================================================
// Vertex RAG API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveContextsRequest {
    vertex_rag_store: VertexRagStore,
    query: RagQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRagStore {
    rag_resources: Vec<RagResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagResource {
    rag_corpus: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagQuery {
    text: String,
    rag_retrieval_config: RagRetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagRetrievalConfig {
    top_k: usize,
}

#[derive(Debug, Default, Deserialize)]
struct RetrieveContextsResponse {
    #[serde(default)]
    contexts: ContextList,
}

#[derive(Debug, Default, Deserialize)]
struct ContextList {
    #[serde(default)]
    contexts: Vec<RagContext>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RagContext {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source_uri: String,
}
