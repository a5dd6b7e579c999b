// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use fabstir_qa_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    embeddings::load_embedder,
    retrieval::QaService,
};
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!(
        "Starting Fabstir QA Node v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = NodeConfig::load(None).context("Invalid configuration")?;
    info!(
        "Embedding provider: {:?}, model: {}, batch size: {}",
        config.embedding.provider, config.embedding.model_name, config.embedding.batch_size
    );

    // The node is useless without a model: fail before binding the port
    let embedder = match load_embedder(&config.embedding) {
        Ok(embedder) => embedder,
        Err(e) => {
            error!("Embedding model failed to load: {}", e);
            return Err(e).context("Cannot start without an embedding model");
        }
    };
    info!(
        "Embedding model {} ready ({} dimensions)",
        embedder.model_name(),
        embedder.dimension()
    );

    let service = QaService::new(embedder).with_default_batch_size(config.embedding.batch_size)?;
    let state = AppState::new(Arc::new(service), config);

    info!("Endpoints:");
    info!("  Health:      GET  /health");
    info!("  Set context: POST /v1/context");
    info!("  Context:     GET  /v1/context");
    info!("  Answers:     POST /v1/answers");

    start_server(state).await
}
