//! service-core: Shared infrastructure for the RAG chat service and its clients.
pub mod config;
pub mod contracts;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
