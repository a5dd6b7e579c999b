// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::error::QaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    ValidationError {
        field: String,
        message: String,
    },
    ShapeMismatch {
        questions: usize,
        answers: usize,
    },
    ContextNotSet,
    EmptyContext,
    EmbeddingFailure(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::ShapeMismatch { questions, answers } => {
                let mut details = HashMap::new();
                details.insert(
                    "questions".to_string(),
                    serde_json::Value::Number((*questions).into()),
                );
                details.insert(
                    "answers".to_string(),
                    serde_json::Value::Number((*answers).into()),
                );
                (
                    "shape_mismatch",
                    format!(
                        "questions and answers must have the same length (got {} and {})",
                        questions, answers
                    ),
                    Some(details),
                )
            }
            ApiError::ContextNotSet => (
                "context_not_set",
                "No context has been set; POST /v1/context first".to_string(),
                None,
            ),
            ApiError::EmptyContext => (
                "empty_context",
                "The active context is empty".to_string(),
                None,
            ),
            ApiError::EmbeddingFailure(msg) => ("embedding_failure", msg.clone(), None),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } | ApiError::ShapeMismatch { .. } => 400,
            ApiError::ContextNotSet | ApiError::EmptyContext => 409,
            ApiError::EmbeddingFailure(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ShapeMismatch { questions, answers } => write!(
                f,
                "Shape mismatch: {} questions, {} answers",
                questions, answers
            ),
            ApiError::ContextNotSet => write!(f, "Context not set"),
            ApiError::EmptyContext => write!(f, "Context is empty"),
            ApiError::EmbeddingFailure(msg) => write!(f, "Embedding failure: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::ShapeMismatch { questions, answers } => {
                ApiError::ShapeMismatch { questions, answers }
            }
            QaError::ContextNotSet => ApiError::ContextNotSet,
            QaError::EmptyContext => ApiError::EmptyContext,
            QaError::EmbeddingFailure(msg) => ApiError::EmbeddingFailure(msg),
            QaError::ModelUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            QaError::InvalidBatchSize(size) => ApiError::ValidationError {
                field: "batchSize".to_string(),
                message: format!("batchSize must be at least 1 (got {})", size),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response(None))).into_response()
    }
}
