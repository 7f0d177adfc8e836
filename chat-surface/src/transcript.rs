use service_core::contracts::{Role, Turn};
use uuid::Uuid;

/// Starter message shown before the first question. Never sent as history.
pub const GREETING: &str =
    "Hi! Ask me anything about the documents in the knowledge base.";

/// A transcript entry: a turn plus its id and any cited sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub sources: Vec<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content == GREETING
    }

    pub fn turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Append-only, in-memory conversation for one session.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A transcript holding only the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING, Vec::new())],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Role/content turns to send as history, without the greeting.
    pub fn history(&self) -> Vec<Turn> {
        self.messages
            .iter()
            .filter(|m| !m.is_placeholder())
            .map(Message::turn)
            .collect()
    }
}
