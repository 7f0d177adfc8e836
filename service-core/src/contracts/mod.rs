//! Wire types exchanged between the chat surface and the RAG chat service.

pub mod chat;

pub use chat::{ChatRequest, ChatResponse, HealthResponse, ReindexResponse, Role, Turn};
