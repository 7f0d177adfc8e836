//! Domain models for the RAG chat service.

pub mod context;

pub use context::RetrievedContext;
pub use service_core::contracts::{ChatRequest, ChatResponse, Role, Turn};
