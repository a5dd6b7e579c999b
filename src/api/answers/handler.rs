// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/answers HTTP handler

use crate::api::answers::GetAnswersRequest;
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::retrieval::QueryResult;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::warn;

/// POST /v1/answers
///
/// # Response Body
/// ```json
/// [
///   {
///     "orig_q": "Which days have the most events played at?",
///     "best_q": "What days are most games played?",
///     "best_a": "Saturday"
///   }
/// ]
/// ```
pub async fn get_answers_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GetAnswersRequest>,
) -> Result<Json<Vec<QueryResult>>, ApiError> {
    if let Err(e) = request.validate(&state.config.limits) {
        warn!("Rejected answers request: {}", e);
        return Err(e);
    }

    let results = state
        .service
        .get_answers(request.questions, request.batch_size)
        .await?;

    Ok(Json(results))
}
