//! Answer orchestration: retrieve passages, then generate a grounded answer.
//!
//! The pipeline has two steps. Retrieval always runs; when it finds nothing
//! the request short-circuits to a fixed reply and generation is never
//! called.

use crate::config::AnswerMode;
use crate::models::{ChatResponse, RetrievedContext, Turn};
use crate::services::providers::{
    AnswerGenerator, ContextRetriever, GenerationRequest, ProviderError,
};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Most recent turns forwarded to generation.
pub const MAX_HISTORY_TURNS: usize = 8;

pub const GENERATION_TEMPERATURE: f32 = 0.2;

/// Characters kept per passage in the extractive preview.
pub const SNIPPET_CHAR_LIMIT: usize = 280;

/// Passages shown in the extractive preview.
pub const MAX_PREVIEW_SNIPPETS: usize = 3;

pub const NO_CONTEXT_ANSWER: &str = "I could not retrieve relevant context for that question \
from the knowledge base. Please try rephrasing it or asking about a more specific topic.";

pub const NO_ANSWER: &str = "I do not have an answer.";

const NO_MODEL_NOTICE: &str =
    "No model response was generated. These are the most relevant passages found:";

const SYSTEM_INSTRUCTION: &str = "You are a retrieval-augmented assistant. Answer the user's \
question using only the context provided below. If the context is not sufficient to answer, \
say so plainly and state what information is missing. Do not invent facts.";

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<AnswerError> for AppError {
    fn from(err: AnswerError) -> Self {
        match err {
            AnswerError::Validation(msg) => AppError::BadRequest(msg),
            AnswerError::Provider(e) => e.into(),
        }
    }
}

/// Coordinates the retrieval and generation collaborators for one question.
pub struct AnswerOrchestrator {
    retriever: Arc<dyn ContextRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
    mode: AnswerMode,
}

impl AnswerOrchestrator {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        generator: Arc<dyn AnswerGenerator>,
        top_k: usize,
        mode: AnswerMode,
    ) -> Self {
        Self {
            retriever,
            generator,
            top_k: top_k.max(1),
            mode,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `message` given the prior conversation.
    pub async fn handle(
        &self,
        message: &str,
        history: &[Turn],
    ) -> Result<ChatResponse, AnswerError> {
        let question = message.trim();
        if question.is_empty() {
            return Err(AnswerError::Validation("message is required".to_string()));
        }

        let history = recent_history(history);
        let contexts = self.retriever.retrieve(question, self.top_k).await?;

        if contexts.is_empty() {
            tracing::info!("No context retrieved, answering with fallback");
            return Ok(ChatResponse {
                answer: fallback_answer(question, &contexts),
                sources: Vec::new(),
            });
        }

        let sources = unique_sources(&contexts);

        if self.mode == AnswerMode::Extractive {
            return Ok(ChatResponse {
                answer: fallback_answer(question, &contexts),
                sources,
            });
        }

        let request = GenerationRequest {
            system_instruction: system_instruction(&contexts),
            history: history.to_vec(),
            message: question.to_string(),
            temperature: GENERATION_TEMPERATURE,
        };

        let generated = self.generator.generate(&request).await?;
        let answer = match generated.trim() {
            "" => NO_ANSWER.to_string(),
            text => text.to_string(),
        };

        tracing::info!(
            contexts = contexts.len(),
            sources = sources.len(),
            history_len = history.len(),
            "Generated answer"
        );

        Ok(ChatResponse { answer, sources })
    }
}

/// The last [`MAX_HISTORY_TURNS`] turns, in original order.
pub fn recent_history(history: &[Turn]) -> &[Turn] {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    &history[start..]
}

/// Source URIs in first-seen order, each once.
pub fn unique_sources(contexts: &[RetrievedContext]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for context in contexts {
        if !sources.contains(&context.source_uri) {
            sources.push(context.source_uri.clone());
        }
    }
    sources
}

/// Numbered `[Chunk i]` passages separated by blank lines.
pub fn context_block(contexts: &[RetrievedContext]) -> String {
    contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Chunk {}] {}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn system_instruction(contexts: &[RetrievedContext]) -> String {
    format!("{}\n\nContext:\n{}", SYSTEM_INSTRUCTION, context_block(contexts))
}

/// Answer produced without the generation model.
pub fn fallback_answer(question: &str, contexts: &[RetrievedContext]) -> String {
    if contexts.is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }

    let mut lines = vec![format!("Question: {}", question), NO_MODEL_NOTICE.to_string()];
    lines.extend(
        contexts
            .iter()
            .take(MAX_PREVIEW_SNIPPETS)
            .enumerate()
            .map(|(i, c)| format!("({}) {}", i + 1, snippet(&c.text))),
    );
    lines.join("\n\n")
}

fn snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SNIPPET_CHAR_LIMIT {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_CHAR_LIMIT).collect();
    format!("{}...", cut.trim_end())
}
