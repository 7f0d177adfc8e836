//! Gemini generation through Vertex AI.
//!
//! Sends the system instruction, the role-mapped history and the current
//! question to `generateContent` and returns the first candidate's text.

use super::{ensure_success, AnswerGenerator, GenerationRequest, ProviderError, TokenSource};
use crate::config::VertexConfig;
use crate::models::{Role, Turn};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gemini text generator on Vertex AI.
pub struct VertexGeminiGenerator {
    config: VertexConfig,
    client: Client,
    tokens: Arc<dyn TokenSource>,
}

impl VertexGeminiGenerator {
    pub fn new(config: VertexConfig, client: Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    /// Build the API URL for the configured model and method.
    fn api_url(&self, location: &str, method: &str) -> Result<String, ProviderError> {
        Ok(format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.config.endpoint_root(location),
            self.config.project()?,
            location,
            self.config.model()?,
            method
        ))
    }
}

/// Gemini's role vocabulary: assistant turns are `model`.
fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn to_content(turn: &Turn) -> Content {
    Content {
        role: Some(gemini_role(turn.role).to_string()),
        parts: vec![Part::text(&turn.content)],
    }
}

fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request.history.iter().map(to_content).collect();
    contents.push(to_content(&Turn::user(request.message.clone())));

    GenerateContentRequest {
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(&request.system_instruction)],
        }),
        contents,
        generation_config: Some(GenerationConfig {
            temperature: Some(request.temperature),
        }),
    }
}

#[async_trait]
impl AnswerGenerator for VertexGeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let location = self.config.location()?;
        let url = self.api_url(location, "generateContent")?;
        let token = self.tokens.access_token().await?;

        tracing::debug!(
            model = ?self.config.model,
            history_len = request.history.len(),
            prompt_len = request.system_instruction.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&build_request(request))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = ensure_success("Generation", response).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("generateContent: {}", e)))?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// Only text parts matter here; other part kinds deserialize with `text: None`.
#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
