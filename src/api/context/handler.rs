// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Handlers for /v1/context

use crate::api::context::{SetContextRequest, SetContextResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::retrieval::ContextInfo;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{info, warn};

/// POST /v1/context
///
/// Validates the body, embeds the questions and swaps in the new context.
/// On error the previous context remains active.
pub async fn set_context_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetContextRequest>,
) -> Result<Json<SetContextResponse>, ApiError> {
    if let Err(e) = request.validate(&state.config.limits) {
        warn!("Rejected context request: {}", e);
        return Err(e);
    }

    let size = request.questions.len();
    info!("Setting context with {} entries", size);

    state
        .service
        .set_context(request.questions, request.answers)
        .await?;

    Ok(Json(SetContextResponse::ok(size)))
}

/// GET /v1/context
pub async fn context_info_handler(State(state): State<Arc<AppState>>) -> Json<ContextInfo> {
    Json(state.service.context_info().await)
}
