// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Batching adapter from a [`TokenEncoder`] to an [`Embedder`]

use super::pooling::masked_mean_pool;
use super::{Embedder, Embedding, TokenBatch, TokenEncoder};
use crate::error::{QaError, Result};
use tracing::debug;

/// Embedder that runs a token encoder chunk by chunk and mean-pools the
/// token vectors under the attention mask.
///
/// Each chunk's output is checked for shape and finiteness before pooling;
/// a single bad chunk fails the whole call.
#[derive(Debug, Clone)]
pub struct PooledEmbedder<E> {
    encoder: E,
}

impl<E: TokenEncoder> PooledEmbedder<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    /// Returns the wrapped encoder
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Embedding>> {
        let batch = self
            .encoder
            .encode(chunk)
            .map_err(|e| QaError::EmbeddingFailure(format!("{:#}", e)))?;

        self.validate_batch(&batch, chunk.len())?;

        let pooled = masked_mean_pool(batch.token_embeddings.view(), batch.attention_mask.view());
        // Finite token values can still overflow when summed
        if let Some(row) = pooled
            .outer_iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
        {
            return Err(QaError::EmbeddingFailure(format!(
                "pooled embedding {} contains NaN or infinite values",
                row
            )));
        }
        Ok(pooled.outer_iter().map(|row| row.to_vec()).collect())
    }

    fn validate_batch(&self, batch: &TokenBatch, expected_items: usize) -> Result<()> {
        let (items, seq_len, hidden) = batch.token_embeddings.dim();
        let (mask_items, mask_len) = batch.attention_mask.dim();

        if items != expected_items {
            return Err(QaError::EmbeddingFailure(format!(
                "encoder returned {} sequences for {} texts",
                items, expected_items
            )));
        }
        if mask_items != items || mask_len != seq_len {
            return Err(QaError::EmbeddingFailure(format!(
                "attention mask shape [{}, {}] does not match token output [{}, {}]",
                mask_items, mask_len, items, seq_len
            )));
        }
        if hidden != self.encoder.hidden_size() {
            return Err(QaError::EmbeddingFailure(format!(
                "encoder returned hidden size {} (expected {})",
                hidden,
                self.encoder.hidden_size()
            )));
        }
        if batch.token_embeddings.iter().any(|v| !v.is_finite()) {
            return Err(QaError::EmbeddingFailure(
                "encoder output contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }
}

impl<E: TokenEncoder> Embedder for PooledEmbedder<E> {
    fn embed(&self, texts: &[String], batch_size: usize) -> Result<Vec<Embedding>> {
        if batch_size == 0 {
            return Err(QaError::InvalidBatchSize(batch_size));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (index, chunk) in texts.chunks(batch_size).enumerate() {
            debug!(
                "Embedding chunk {} ({} texts) with {}",
                index,
                chunk.len(),
                self.encoder.model_name()
            );
            embeddings.extend(self.embed_chunk(chunk)?);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.encoder.hidden_size()
    }

    fn model_name(&self) -> &str {
        self.encoder.model_name()
    }
}
