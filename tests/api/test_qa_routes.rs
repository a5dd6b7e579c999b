// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route tests for /health, /v1/context and /v1/answers
//!
//! The router is driven in-process with `oneshot`; the hashed provider
//! stands in for the ONNX model.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use fabstir_qa_node::{
    api::http_server::{create_app, AppState},
    config::{EmbeddingProviderKind, NodeConfig},
    embeddings::load_embedder,
    QaService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

fn test_app() -> Router {
    let mut config = NodeConfig::default();
    config.embedding.provider = EmbeddingProviderKind::Hashed;
    config.embedding.model_name = "hashed-test".to_string();

    let embedder = load_embedder(&config.embedding).expect("hashed embedder");
    let service = Arc::new(QaService::new(embedder));
    create_app(Arc::new(AppState::new(service, config)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn set_club_context(app: &Router) {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/context",
        Some(json!({
            "questions": ["How many club members are there?", "What days are most games played?"],
            "answers": ["20", "Saturday"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "contextSize": 2}));
}

#[tokio::test]
async fn test_health_reports_model() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "hashed-test");
    assert_eq!(body["dimension"], 384);
    assert_eq!(body["contextLoaded"], false);
}

#[tokio::test]
async fn test_context_info_tracks_state() {
    let app = test_app();

    let (_, before) = send(&app, Method::GET, "/v1/context", None).await;
    assert_eq!(before["state"], "unset");
    assert_eq!(before["size"], 0);

    set_club_context(&app).await;

    let (status, after) = send(&app, Method::GET, "/v1/context", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["state"], "set");
    assert_eq!(after["size"], 2);
    assert_eq!(after["model"], "hashed-test");

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["contextLoaded"], true);
}

#[tokio::test]
async fn test_answers_club_scenario() {
    let app = test_app();
    set_club_context(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/answers",
        Some(json!({
            "questions": ["Which days have the most events played at?"],
            "batchSize": 1
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "orig_q": "Which days have the most events played at?",
            "best_q": "What days are most games played?",
            "best_a": "Saturday"
        }])
    );
}

#[tokio::test]
async fn test_answers_preserve_order_without_batch_size() {
    let app = test_app();
    set_club_context(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/answers",
        Some(json!({
            "questions": ["What days are most games played?", "How many club members are there?"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let answers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["best_a"].as_str().unwrap())
        .collect();
    assert_eq!(answers, vec!["Saturday", "20"]);
}

#[tokio::test]
async fn test_shape_mismatch_is_400() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/context",
        Some(json!({"questions": ["a", "b", "c"], "answers": ["1", "2"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "shape_mismatch");
    assert_eq!(body["details"]["questions"], 3);
    assert_eq!(body["details"]["answers"], 2);

    // Nothing was installed
    let (_, info) = send(&app, Method::GET, "/v1/context", None).await;
    assert_eq!(info["state"], "unset");
}

#[tokio::test]
async fn test_answers_before_context_is_409() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/answers",
        Some(json!({"questions": ["anything"]})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_type"], "context_not_set");
}

#[tokio::test]
async fn test_answers_against_empty_context_is_409() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/context",
        Some(json!({"questions": [], "answers": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contextSize"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/answers",
        Some(json!({"questions": ["anything"]})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_type"], "empty_context");
}

#[tokio::test]
async fn test_zero_batch_size_is_400() {
    let app = test_app();
    set_club_context(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/answers",
        Some(json!({"questions": ["q"], "batchSize": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "batchSize");
}

#[tokio::test]
async fn test_unknown_fields_rejected() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/context",
        Some(json!({"questions": [], "answers": [], "scores": []})),
    )
    .await;

    assert!(status.is_client_error(), "got {}", status);
}

#[tokio::test]
async fn test_answers_rejects_get() {
    let app = test_app();
    let (status, _) = send(&app, Method::GET, "/v1/answers", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
