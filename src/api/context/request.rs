// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! SetContextRequest type for POST /v1/context

use crate::api::{validate_text_lengths, ApiError};
use crate::config::LimitsConfig;
use serde::{Deserialize, Serialize};

/// Request body for POST /v1/context
///
/// # Example
/// ```json
/// {
///   "questions": ["How many club members are there?", "What days are most games played?"],
///   "answers": ["20", "Saturday"]
/// }
/// ```
///
/// Empty arrays are accepted and produce an empty context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetContextRequest {
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

impl SetContextRequest {
    /// # Validation Rules
    /// 1. **questions/answers**: same length (`ShapeMismatch`)
    /// 2. **size**: at most `max_context_entries` pairs
    /// 3. **text length**: each text at most `max_text_length` bytes
    pub fn validate(&self, limits: &LimitsConfig) -> Result<(), ApiError> {
        if self.questions.len() != self.answers.len() {
            return Err(ApiError::ShapeMismatch {
                questions: self.questions.len(),
                answers: self.answers.len(),
            });
        }

        if self.questions.len() > limits.max_context_entries {
            return Err(ApiError::ValidationError {
                field: "questions".to_string(),
                message: format!(
                    "context cannot contain more than {} entries (got {})",
                    limits.max_context_entries,
                    self.questions.len()
                ),
            });
        }

        validate_text_lengths("questions", &self.questions, limits.max_text_length)?;
        validate_text_lengths("answers", &self.answers, limits.max_text_length)?;
        Ok(())
    }
}
