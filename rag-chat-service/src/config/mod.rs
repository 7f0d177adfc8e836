use crate::services::providers::ProviderError;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Passages requested per retrieval call when `RAG_TOP_K` is unset or unparsable.
pub const DEFAULT_TOP_K: usize = 4;

/// Reported as `sourceMode` by the health endpoint.
pub const SOURCE_MODE: &str = "vertex_rag";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub common: core_config::Config,
    pub vertex: VertexConfig,
    pub retrieval: RetrievalConfig,
    pub credentials: CredentialConfig,
}

/// Connection parameters for Vertex AI.
///
/// Every field is optional at load time; the providers reject missing
/// values when a request actually needs them.
#[derive(Debug, Clone, Default)]
pub struct VertexConfig {
    pub project: Option<String>,
    pub location: Option<String>,
    /// Gemini model id, e.g. `gemini-2.0-flash`.
    pub model: Option<String>,
    /// Corpus id, or full `projects/.../ragCorpora/...` resource name.
    pub corpus: Option<String>,
    /// Replaces the regional `https://{location}-aiplatform.googleapis.com` root.
    pub api_base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub answer_mode: AnswerMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            answer_mode: AnswerMode::Generate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Pre-issued bearer token; checked before the metadata server.
    pub access_token: Option<String>,
    pub metadata_host: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

/// How answers are produced once passages were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// Ask the generation model to answer from the passages.
    Generate,
    /// Return the question with numbered passage previews, no model call.
    Extractive,
}

impl FromStr for AnswerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" => Ok(AnswerMode::Generate),
            "extractive" => Ok(AnswerMode::Extractive),
            other => Err(format!("unknown answer mode '{}'", other)),
        }
    }
}

impl RagConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let answer_mode = match optional_env("RAG_ANSWER_MODE") {
            Some(raw) => raw
                .parse::<AnswerMode>()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            None => AnswerMode::Generate,
        };

        Ok(RagConfig {
            common: common_config,
            vertex: VertexConfig {
                project: optional_env("GOOGLE_CLOUD_PROJECT"),
                location: optional_env("VERTEX_LOCATION"),
                model: optional_env("VERTEX_MODEL"),
                corpus: optional_env("VERTEX_RAG_CORPUS"),
                api_base: optional_env("VERTEX_API_BASE"),
            },
            retrieval: RetrievalConfig {
                top_k: parse_top_k(optional_env("RAG_TOP_K").as_deref()),
                answer_mode,
            },
            credentials: CredentialConfig {
                access_token: optional_env("GOOGLE_ACCESS_TOKEN"),
                metadata_host: optional_env("GCE_METADATA_HOST")
                    .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
            },
        })
    }
}

impl VertexConfig {
    /// Fails on the first required connection parameter that is missing.
    ///
    /// Run before retrieval so a service without a model is rejected even
    /// when the request never reaches generation.
    pub fn validate(&self) -> Result<(), ProviderError> {
        self.project()?;
        self.location()?;
        self.model()?;
        self.corpus_resource()?;
        Ok(())
    }

    pub fn project(&self) -> Result<&str, ProviderError> {
        required(&self.project, "GOOGLE_CLOUD_PROJECT")
    }

    pub fn location(&self) -> Result<&str, ProviderError> {
        required(&self.location, "VERTEX_LOCATION")
    }

    pub fn model(&self) -> Result<&str, ProviderError> {
        required(&self.model, "VERTEX_MODEL")
    }

    /// Full corpus resource name, expanding a bare corpus id.
    pub fn corpus_resource(&self) -> Result<String, ProviderError> {
        let corpus = required(&self.corpus, "VERTEX_RAG_CORPUS")?;
        if corpus.starts_with("projects/") {
            return Ok(corpus.to_string());
        }
        Ok(format!(
            "projects/{}/locations/{}/ragCorpora/{}",
            self.project()?,
            self.location()?,
            corpus
        ))
    }

    /// Root URL for Vertex AI calls in `location`, without a trailing slash.
    pub fn endpoint_root(&self, location: &str) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None if location == "global" => "https://aiplatform.googleapis.com".to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", location),
        }
    }
}

/// Parse `RAG_TOP_K`, clamping to at least one.
pub fn parse_top_k(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|value| value.max(1) as usize)
        .unwrap_or(DEFAULT_TOP_K)
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, ProviderError> {
    value
        .as_deref()
        .ok_or_else(|| ProviderError::NotConfigured(format!("{} is not set", key)))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex() -> VertexConfig {
        VertexConfig {
            project: Some("farm-project".into()),
            location: Some("us-west1".into()),
            model: Some("gemini-2.0-flash".into()),
            corpus: Some("1234".into()),
            api_base: None,
        }
    }

    #[test]
    fn top_k_defaults_and_clamps() {
        assert_eq!(parse_top_k(None), DEFAULT_TOP_K);
        assert_eq!(parse_top_k(Some("not-a-number")), DEFAULT_TOP_K);
        assert_eq!(parse_top_k(Some("0")), 1);
        assert_eq!(parse_top_k(Some("-3")), 1);
        assert_eq!(parse_top_k(Some(" 8 ")), 8);
    }

    #[test]
    fn bare_corpus_id_expands_to_resource_name() {
        assert_eq!(
            vertex().corpus_resource().unwrap(),
            "projects/farm-project/locations/us-west1/ragCorpora/1234"
        );
    }

    #[test]
    fn full_corpus_resource_is_kept() {
        let config = VertexConfig {
            corpus: Some("projects/p/locations/l/ragCorpora/9".into()),
            ..vertex()
        };
        assert_eq!(
            config.corpus_resource().unwrap(),
            "projects/p/locations/l/ragCorpora/9"
        );
    }

    #[test]
    fn missing_model_is_not_configured() {
        let config = VertexConfig {
            model: None,
            ..vertex()
        };
        match config.model() {
            Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("VERTEX_MODEL")),
            other => panic!("expected NotConfigured, got {:?}", other),
        }
    }

    #[test]
    fn validate_requires_all_connection_parameters() {
        assert!(vertex().validate().is_ok());

        let cases = [
            (VertexConfig { project: None, ..vertex() }, "GOOGLE_CLOUD_PROJECT"),
            (VertexConfig { location: None, ..vertex() }, "VERTEX_LOCATION"),
            (VertexConfig { model: None, ..vertex() }, "VERTEX_MODEL"),
            (VertexConfig { corpus: None, ..vertex() }, "VERTEX_RAG_CORPUS"),
        ];
        for (config, key) in cases {
            match config.validate() {
                Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains(key), "{}", msg),
                other => panic!("expected NotConfigured for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn endpoint_root_follows_location() {
        let config = vertex();
        assert_eq!(
            config.endpoint_root("us-west1"),
            "https://us-west1-aiplatform.googleapis.com"
        );
        assert_eq!(
            config.endpoint_root("global"),
            "https://aiplatform.googleapis.com"
        );

        let overridden = VertexConfig {
            api_base: Some("http://127.0.0.1:9000/".into()),
            ..vertex()
        };
        assert_eq!(overridden.endpoint_root("us-west1"), "http://127.0.0.1:9000");
    }

    #[test]
    fn answer_mode_parses_case_insensitively() {
        assert_eq!("Extractive".parse::<AnswerMode>(), Ok(AnswerMode::Extractive));
        assert_eq!("generate".parse::<AnswerMode>(), Ok(AnswerMode::Generate));
        assert!("summarize".parse::<AnswerMode>().is_err());
    }
}
