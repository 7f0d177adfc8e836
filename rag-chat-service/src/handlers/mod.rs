//! HTTP handlers for the RAG chat service.

pub mod chat;
pub mod health;
pub mod reindex;
