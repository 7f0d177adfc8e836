//! HTTP surface tests against the router with scripted providers.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use rag_chat_service::config::AnswerMode;
use rag_chat_service::models::RetrievedContext;
use rag_chat_service::services::providers::mock::{MockFailure, MockGenerator, MockRetriever};
use rag_chat_service::services::AnswerOrchestrator;
use rag_chat_service::startup::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(retriever: Arc<MockRetriever>, generator: Arc<MockGenerator>) -> Router {
    let config = common::test_config(None);
    let orchestrator = AnswerOrchestrator::new(
        retriever,
        generator,
        config.retrieval.top_k,
        AnswerMode::Generate,
    );
    build_router(AppState::new(config, Arc::new(orchestrator)))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_configuration() {
    let app = app(Arc::new(MockRetriever::empty()), Arc::new(MockGenerator::new("")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["sourceMode"], "vertex_rag");
    assert_eq!(body["model"], "gemini-2.0-flash");
    assert_eq!(body["project"], "farm-project");
    assert_eq!(body["location"], "us-west1");
    assert_eq!(body["corpus"], "4611686018427387904");
    assert_eq!(body["topK"], 4);
}

#[tokio::test]
async fn reindex_is_informational() {
    let app = app(Arc::new(MockRetriever::empty()), Arc::new(MockGenerator::new("")));

    let (status, body) = post_json(app, "/api/reindex", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["message"].as_str().unwrap().contains("Vertex AI RAG corpus"));
}

#[tokio::test]
async fn missing_message_is_400() {
    let retriever = Arc::new(MockRetriever::empty());
    let app = app(retriever.clone(), Arc::new(MockGenerator::new("")));

    let (status, body) = post_json(app, "/api/chat", json!({"history": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "message is required");
    assert_eq!(retriever.call_count(), 0);
}

#[tokio::test]
async fn whitespace_message_is_400() {
    let app = app(Arc::new(MockRetriever::empty()), Arc::new(MockGenerator::new("")));

    let (status, body) = post_json(app, "/api/chat", json!({"message": "   "})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_body_is_400_with_error_field() {
    let app = app(Arc::new(MockRetriever::empty()), Arc::new(MockGenerator::new("")));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn empty_retrieval_returns_fallback_without_generation() {
    let generator = Arc::new(MockGenerator::new("never"));
    let app = app(Arc::new(MockRetriever::empty()), generator.clone());

    let (status, body) = post_json(
        app,
        "/api/chat",
        json!({"message": "What irrigation schedule is recommended?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("I could not retrieve relevant context"));
    assert_eq!(body["sources"], json!([]));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn grounded_answer_with_unique_sources() {
    let retriever = Arc::new(MockRetriever::new(vec![
        RetrievedContext::new("Irrigate twice weekly...", "doc1.pdf"),
        RetrievedContext::new("Mulch retains moisture.", "doc2.pdf"),
        RetrievedContext::new("Water early in the morning.", "doc1.pdf"),
    ]));
    let generator = Arc::new(MockGenerator::new("Irrigate twice a week."));
    let app = app(retriever, generator.clone());

    let history: Vec<Value> = (0..10)
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            json!({"role": role, "content": format!("turn {}", i)})
        })
        .collect();

    let (status, body) = post_json(
        app,
        "/api/chat",
        json!({"message": "What irrigation schedule is recommended?", "history": history}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Irrigate twice a week.");
    assert_eq!(body["sources"], json!(["doc1.pdf", "doc2.pdf"]));

    let request = generator.last_request().unwrap();
    assert!(request
        .system_instruction
        .contains("[Chunk 1] Irrigate twice weekly..."));
    assert_eq!(request.history.len(), 8);
    assert_eq!(request.history[0].content, "turn 2");
    assert_eq!(request.history[7].content, "turn 9");
}

#[tokio::test]
async fn upstream_failure_is_500_with_status_and_body() {
    let app = app(
        Arc::new(MockRetriever::failing(MockFailure::new(
            403,
            "{\"error\":{\"status\":\"PERMISSION_DENIED\"}}",
        ))),
        Arc::new(MockGenerator::new("")),
    );

    let (status, body) = post_json(app, "/api/chat", json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("403"));
    assert!(error.contains("PERMISSION_DENIED"));
}
