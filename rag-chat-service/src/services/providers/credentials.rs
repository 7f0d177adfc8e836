//! Access-token sources for Vertex AI.
//!
//! A pre-issued token from the environment wins; otherwise the GCE/Cloud Run
//! metadata server is asked for the attached service account's token.

use super::{ProviderError, TokenSource};
use crate::config::CredentialConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Metadata tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A fixed token, typically from `GOOGLE_ACCESS_TOKEN`.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, ProviderError> {
        if self.token.trim().is_empty() {
            return Err(ProviderError::Credential("static token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// Token of the default service account, served by the metadata server.
///
/// The token is cached until shortly before its `expires_in` deadline.
pub struct MetadataServerTokenSource {
    client: Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl MetadataServerTokenSource {
    pub fn new(client: Client, host: &str) -> Self {
        let root = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };

        Self {
            client,
            url: format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                root
            ),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<MetadataToken, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ProviderError::Credential(format!("metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Credential(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Credential(format!("malformed token response: {}", e)))
    }
}

#[async_trait]
impl TokenSource for MetadataServerTokenSource {
    async fn access_token(&self) -> Result<String, ProviderError> {
        // Held across the fetch so concurrent requests share one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        *cached = token
            .expires_in
            .map(Duration::from_secs)
            .filter(|lifetime| *lifetime > EXPIRY_MARGIN)
            .map(|lifetime| CachedToken {
                value: token.access_token.clone(),
                refresh_at: Instant::now() + lifetime - EXPIRY_MARGIN,
            });

        tracing::debug!(cached = cached.is_some(), "Fetched metadata server token");
        Ok(token.access_token)
    }
}

/// Tries each source in order and returns the first non-empty token.
pub struct TokenChain {
    sources: Vec<Arc<dyn TokenSource>>,
}

impl TokenChain {
    pub fn new(sources: Vec<Arc<dyn TokenSource>>) -> Self {
        Self { sources }
    }

    /// Environment token first (when set), then the metadata server.
    pub fn from_config(config: &CredentialConfig, client: Client) -> Self {
        let mut sources: Vec<Arc<dyn TokenSource>> = Vec::new();
        if let Some(token) = &config.access_token {
            sources.push(Arc::new(StaticTokenSource::new(token.clone())));
        }
        sources.push(Arc::new(MetadataServerTokenSource::new(
            client,
            &config.metadata_host,
        )));
        Self::new(sources)
    }
}

#[async_trait]
impl TokenSource for TokenChain {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut failures = Vec::new();

        for source in &self.sources {
            match source.access_token().await {
                Ok(token) if !token.trim().is_empty() => return Ok(token),
                Ok(_) => failures.push("empty token".to_string()),
                Err(e) => failures.push(e.to_string()),
            }
        }

        Err(ProviderError::Credential(if failures.is_empty() {
            "no token sources configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}
