// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Question answering service
//!
//! [`QaService`] owns the embedder and the single active [`ContextIndex`].
//! The index is published copy-then-swap: `set_context` builds the whole new
//! index before taking the write lock, and queries clone the current `Arc`
//! under a short read lock. A query therefore always works on one complete
//! snapshot, and queries never wait on each other.

use crate::embeddings::{l2_normalize, Embedder, Embedding};
use crate::error::{QaError, Result};
use crate::index::{ContextIndex, VectorIndex};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default chunk size when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Best match for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "orig_q")]
    pub original_question: String,
    #[serde(rename = "best_q")]
    pub matched_question: String,
    #[serde(rename = "best_a")]
    pub matched_answer: String,
}

/// Lifecycle state of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Unset,
    Set,
}

/// Summary of the active context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub state: ContextState,
    pub size: usize,
    pub dimension: usize,
    pub model: String,
}

pub struct QaService {
    embedder: Arc<dyn Embedder>,
    index: RwLock<Option<Arc<ContextIndex>>>,
    default_batch_size: usize,
}

impl std::fmt::Debug for QaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaService")
            .field("model", &self.embedder.model_name())
            .field("dimension", &self.embedder.dimension())
            .field("default_batch_size", &self.default_batch_size)
            .finish_non_exhaustive()
    }
}

impl QaService {
    /// Creates a service in the *unset* state.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: RwLock::new(None),
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the chunk size used by `set_context` and by queries without a hint.
    pub fn with_default_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(QaError::InvalidBatchSize(batch_size));
        }
        self.default_batch_size = batch_size;
        Ok(self)
    }

    pub fn default_batch_size(&self) -> usize {
        self.default_batch_size
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Replaces the active context wholesale.
    ///
    /// On any failure the previous context stays in place.
    pub async fn set_context(&self, questions: Vec<String>, answers: Vec<String>) -> Result<()> {
        if questions.len() != answers.len() {
            warn!(
                "Rejecting context: {} questions, {} answers",
                questions.len(),
                answers.len()
            );
            return Err(QaError::ShapeMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }

        let start = Instant::now();
        let (questions, embeddings) = self.embed(questions, self.default_batch_size).await?;
        let index = ContextIndex::new(questions, answers, embeddings, self.embedder.dimension())?;
        let size = index.len();

        *self.index.write().await = Some(Arc::new(index));

        info!(
            "Context set: {} entries embedded in {}ms",
            size,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Answers each query with the closest context entry, in input order.
    ///
    /// # Errors
    /// - `ContextNotSet` before any context was loaded
    /// - `EmptyContext` if the active context has no entries
    /// - `EmbeddingFailure` / `InvalidBatchSize` from the embedder
    pub async fn get_answers(
        &self,
        queries: Vec<String>,
        batch_size: Option<usize>,
    ) -> Result<Vec<QueryResult>> {
        let index = self.snapshot().await?;
        let batch_size = batch_size.unwrap_or(self.default_batch_size);

        let start = Instant::now();
        let (queries, embeddings) = self.embed(queries, batch_size).await?;

        let mut results = Vec::with_capacity(queries.len());
        for (query, embedding) in queries.into_iter().zip(embeddings) {
            if embedding.len() != index.dimension() {
                return Err(QaError::EmbeddingFailure(format!(
                    "query embedding has dimension {} but index has {}",
                    embedding.len(),
                    index.dimension()
                )));
            }

            let mut vector = Array1::from(embedding);
            l2_normalize(vector.view_mut());

            if vector.iter().any(|v| !v.is_finite()) {
                return Err(QaError::EmbeddingFailure(
                    "query embedding contains NaN or infinite values".to_string(),
                ));
            }

            // The snapshot is non-empty, so no match means no finite score
            let (best, score) = index.vectors().best_match(vector.view()).ok_or_else(|| {
                QaError::EmbeddingFailure(format!("no finite similarity score for {:?}", query))
            })?;
            let (matched_question, matched_answer) =
                index.entry(best).ok_or(QaError::EmptyContext)?;

            debug!("Query {:?} matched entry {} (score {:.4})", query, best, score);

            results.push(QueryResult {
                original_question: query,
                matched_question: matched_question.to_string(),
                matched_answer: matched_answer.to_string(),
            });
        }

        info!(
            "Answered {} queries against {} entries in {}ms (batch size {})",
            results.len(),
            index.len(),
            start.elapsed().as_millis(),
            batch_size
        );
        Ok(results)
    }

    /// Reports the current state without blocking writers for long.
    pub async fn context_info(&self) -> ContextInfo {
        let index = self.index.read().await.clone();
        let (state, size) = match index {
            Some(index) => (ContextState::Set, index.len()),
            None => (ContextState::Unset, 0),
        };
        ContextInfo {
            state,
            size,
            dimension: self.embedder.dimension(),
            model: self.embedder.model_name().to_string(),
        }
    }

    pub async fn is_context_set(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Current non-empty index
    async fn snapshot(&self) -> Result<Arc<ContextIndex>> {
        let index = self
            .index
            .read()
            .await
            .clone()
            .ok_or(QaError::ContextNotSet)?;
        if index.is_empty() {
            return Err(QaError::EmptyContext);
        }
        Ok(index)
    }

    /// Runs the embedder on the blocking pool, handing the texts back.
    async fn embed(
        &self,
        texts: Vec<String>,
        batch_size: usize,
    ) -> Result<(Vec<String>, Vec<Embedding>)> {
        let embedder = Arc::clone(&self.embedder);
        let expected = texts.len();

        let (texts, embeddings) = tokio::task::spawn_blocking(move || {
            let embeddings = embedder.embed(&texts, batch_size);
            (texts, embeddings)
        })
        .await
        .map_err(|e| QaError::EmbeddingFailure(format!("embedding worker failed: {}", e)))?;

        let embeddings = embeddings?;
        if embeddings.len() != expected {
            return Err(QaError::EmbeddingFailure(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                expected
            )));
        }
        Ok((texts, embeddings))
    }
}
