// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::answers::get_answers_handler;
use super::context::{context_info_handler, set_context_handler};
use crate::config::NodeConfig;
use crate::retrieval::QaService;

/// Shared handler state, passed explicitly through the router
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<QaService>,
    pub config: Arc<NodeConfig>,
}

impl AppState {
    pub fn new(service: Arc<QaService>, config: NodeConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimension: usize,
    pub context_loaded: bool,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/v1/context",
            post(set_context_handler).get(context_info_handler),
        )
        .route("/v1/answers", post(get_answers_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let embedder = state.service.embedder();
    Json(HealthResponse {
        status: "ok".to_string(),
        model: embedder.model_name().to_string(),
        dimension: embedder.dimension(),
        context_loaded: state.service.is_context_set().await,
    })
}
