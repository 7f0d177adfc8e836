//! Application startup and lifecycle management.
//!
//! Wires the Vertex providers into the orchestrator, builds the HTTP router
//! and runs it until a shutdown signal arrives.

use crate::config::RagConfig;
use crate::handlers::{chat::chat, health::health, reindex::reindex};
use crate::services::providers::credentials::TokenChain;
use crate::services::providers::gemini::VertexGeminiGenerator;
use crate::services::providers::vertex_rag::VertexRagRetriever;
use crate::services::providers::{AnswerGenerator, ContextRetriever, TokenSource};
use crate::services::AnswerOrchestrator;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, RequestIdMakeSpan};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on a single outbound Vertex call.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RagConfig,
    pub orchestrator: Arc<AnswerOrchestrator>,
}

impl AppState {
    pub fn new(config: RagConfig, orchestrator: Arc<AnswerOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// State backed by the real Vertex AI providers.
    pub fn from_config(config: RagConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("HTTP client: {}", e)))?;

        let tokens: Arc<dyn TokenSource> =
            Arc::new(TokenChain::from_config(&config.credentials, client.clone()));

        let retriever: Arc<dyn ContextRetriever> = Arc::new(VertexRagRetriever::new(
            config.vertex.clone(),
            client.clone(),
            tokens.clone(),
        ));
        let generator: Arc<dyn AnswerGenerator> = Arc::new(VertexGeminiGenerator::new(
            config.vertex.clone(),
            client,
            tokens,
        ));

        let orchestrator = AnswerOrchestrator::new(
            retriever,
            generator,
            config.retrieval.top_k,
            config.retrieval.answer_mode,
        );

        tracing::info!(
            model = ?config.vertex.model,
            corpus = ?config.vertex.corpus,
            top_k = orchestrator.top_k(),
            answer_mode = ?config.retrieval.answer_mode,
            "Initialized Vertex AI providers"
        );

        Ok(Self::new(config, Arc::new(orchestrator)))
    }
}

/// Routes for the chat API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/reindex", post(reindex))
        .route("/api/chat", post(chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RagConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::with_state(state).await
    }

    /// Build the application around prepared state (port 0 = random port).
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let address = state.config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("RAG chat service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
