//! Client-side chat surface for the RAG chat service.
//!
//! Holds the in-memory transcript, submits one question at a time to the
//! backend and lets an in-flight request be cancelled.

pub mod backend;
pub mod surface;
pub mod transcript;

pub use backend::{BackendError, ChatBackend, HttpChatBackend};
pub use surface::{ChatSurface, SubmitOutcome};
pub use transcript::{Message, Transcript, GREETING};
