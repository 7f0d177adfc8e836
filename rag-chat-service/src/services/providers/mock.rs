//! Scripted provider implementations for testing.
//!
//! Each fake records how it was called so tests can assert on invocation
//! counts and arguments.

use super::{AnswerGenerator, ContextRetriever, GenerationRequest, ProviderError};
use crate::models::RetrievedContext;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted failure: an upstream status and body.
#[derive(Debug, Clone)]
pub struct MockFailure {
    pub status: u16,
    pub body: String,
}

impl MockFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn into_error(self, service: &'static str) -> ProviderError {
        ProviderError::Upstream {
            service,
            status: self.status,
            body: self.body,
        }
    }
}

/// Mock retriever returning a fixed list of passages.
#[derive(Default)]
pub struct MockRetriever {
    contexts: Vec<RetrievedContext>,
    failure: Option<MockFailure>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockRetriever {
    pub fn new(contexts: Vec<RetrievedContext>) -> Self {
        Self {
            contexts,
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// `(query, top_k)` of every call, in order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl ContextRetriever for MockRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedContext>, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((query.to_string(), top_k));
        }

        match &self.failure {
            Some(failure) => Err(failure.clone().into_error("Retrieval")),
            None => Ok(self.contexts.clone()),
        }
    }
}

/// Mock generator returning a fixed answer.
#[derive(Default)]
pub struct MockGenerator {
    answer: String,
    failure: Option<MockFailure>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn failing(failure: MockFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl AnswerGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.failure {
            Some(failure) => Err(failure.clone().into_error("Generation")),
            None => Ok(self.answer.clone()),
        }
    }
}
