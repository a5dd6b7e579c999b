// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod answers;
pub mod context;
pub mod errors;
pub mod http_server;

pub use answers::{get_answers_handler, GetAnswersRequest};
pub use context::{SetContextRequest, SetContextResponse};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, start_server, AppState, HealthResponse};

/// Rejects any text longer than `max_len` bytes, naming it as `field[i]`.
pub(crate) fn validate_text_lengths(
    field: &str,
    texts: &[String],
    max_len: usize,
) -> Result<(), ApiError> {
    for (index, text) in texts.iter().enumerate() {
        if text.len() > max_len {
            return Err(ApiError::ValidationError {
                field: format!("{}[{}]", field, index),
                message: format!(
                    "text cannot exceed {} bytes (got {} bytes)",
                    max_len,
                    text.len()
                ),
            });
        }
    }
    Ok(())
}
