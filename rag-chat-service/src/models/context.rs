use serde::{Deserialize, Serialize};

/// A passage returned by the retrieval service for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedContext {
    pub text: String,
    pub source_uri: String,
}

impl RetrievedContext {
    pub fn new(text: impl Into<String>, source_uri: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_uri: source_uri.into(),
        }
    }
}
