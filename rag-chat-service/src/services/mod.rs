pub mod orchestrator;
pub mod providers;

pub use orchestrator::{AnswerError, AnswerOrchestrator};
