// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error types for the question-answering core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, QaError>;

/// Errors surfaced by the embedder, index and retriever
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QaError {
    /// Context questions and answers have different lengths
    #[error("shape mismatch: {questions} questions but {answers} answers")]
    ShapeMismatch { questions: usize, answers: usize },

    /// No context has been loaded yet
    #[error("context not set: load a context before querying")]
    ContextNotSet,

    /// The active context holds no entries
    #[error("context is empty: no entries to match against")]
    EmptyContext,

    /// The embedding provider failed or returned malformed output
    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    /// The embedding provider could not be initialized
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Batch size must be at least one
    #[error("invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),
}
