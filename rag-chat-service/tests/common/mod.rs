#![allow(dead_code)]

use rag_chat_service::config::{
    CredentialConfig, RagConfig, RetrievalConfig, VertexConfig,
};
use service_core::config::Config;

/// Config pointing at a local port-0 listener and a fake Vertex endpoint.
pub fn test_config(api_base: Option<String>) -> RagConfig {
    RagConfig {
        common: Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        vertex: VertexConfig {
            project: Some("farm-project".to_string()),
            location: Some("us-west1".to_string()),
            model: Some("gemini-2.0-flash".to_string()),
            corpus: Some("4611686018427387904".to_string()),
            api_base,
        },
        retrieval: RetrievalConfig::default(),
        credentials: CredentialConfig {
            access_token: Some("test-token".to_string()),
            metadata_host: "127.0.0.1:9".to_string(),
        },
    }
}
