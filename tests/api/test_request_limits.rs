// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Configured limits are enforced before any embedding happens.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fabstir_qa_node::{
    api::http_server::{create_app, AppState},
    config::{EmbeddingProviderKind, LimitsConfig, NodeConfig},
    embeddings::load_embedder,
    QaService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app_with_limits(limits: LimitsConfig) -> Router {
    let mut config = NodeConfig::default();
    config.embedding.provider = EmbeddingProviderKind::Hashed;
    config.embedding.dimension = 64;
    config.limits = limits;

    let embedder = load_embedder(&config.embedding).unwrap();
    create_app(Arc::new(AppState::new(
        Arc::new(QaService::new(embedder)),
        config,
    )))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_too_many_context_entries() {
    let app = app_with_limits(LimitsConfig {
        max_context_entries: 2,
        ..LimitsConfig::default()
    });

    let (status, body) = post(
        &app,
        "/v1/context",
        json!({"questions": ["a", "b", "c"], "answers": ["1", "2", "3"]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "questions");
}

#[tokio::test]
async fn test_too_many_queries() {
    let app = app_with_limits(LimitsConfig {
        max_queries: 1,
        ..LimitsConfig::default()
    });
    post(&app, "/v1/context", json!({"questions": ["a"], "answers": ["1"]})).await;

    let (status, body) = post(&app, "/v1/answers", json!({"questions": ["x", "y"]})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "questions");
}

#[tokio::test]
async fn test_empty_query_list_rejected() {
    let app = app_with_limits(LimitsConfig::default());
    post(&app, "/v1/context", json!({"questions": ["a"], "answers": ["1"]})).await;

    let (status, body) = post(&app, "/v1/answers", json!({"questions": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_text_too_long() {
    let app = app_with_limits(LimitsConfig {
        max_text_length: 8,
        ..LimitsConfig::default()
    });

    let (status, body) = post(
        &app,
        "/v1/context",
        json!({"questions": ["this question is far too long"], "answers": ["1"]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "questions[0]");
}

#[tokio::test]
async fn test_empty_strings_accepted() {
    let app = app_with_limits(LimitsConfig::default());
    let (status, _) = post(&app, "/v1/context", json!({"questions": ["", "b"], "answers": ["", "2"]})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/v1/answers", json!({"questions": [""]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["orig_q"], "");
}
