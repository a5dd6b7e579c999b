// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GetAnswersRequest type for POST /v1/answers

use crate::api::{validate_text_lengths, ApiError};
use crate::config::LimitsConfig;
use serde::{Deserialize, Serialize};

/// Request body for POST /v1/answers
///
/// # Fields
/// - `questions`: 1 to `max_queries` query strings
/// - `batch_size`: optional embedding chunk size (default from config)
///
/// # Example
/// ```json
/// {
///   "questions": ["Which days have the most events played at?"],
///   "batchSize": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetAnswersRequest {
    pub questions: Vec<String>,

    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl GetAnswersRequest {
    pub fn validate(&self, limits: &LimitsConfig) -> Result<(), ApiError> {
        if self.questions.is_empty() {
            return Err(ApiError::ValidationError {
                field: "questions".to_string(),
                message: "questions array must contain at least 1 item".to_string(),
            });
        }

        if self.questions.len() > limits.max_queries {
            return Err(ApiError::ValidationError {
                field: "questions".to_string(),
                message: format!(
                    "questions array cannot contain more than {} items (got {})",
                    limits.max_queries,
                    self.questions.len()
                ),
            });
        }

        if self.batch_size == Some(0) {
            return Err(ApiError::ValidationError {
                field: "batchSize".to_string(),
                message: "batchSize must be at least 1".to_string(),
            });
        }

        validate_text_lengths("questions", &self.questions, limits.max_text_length)
    }
}
