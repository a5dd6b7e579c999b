// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Text embedding
//!
//! Two layers:
//! - [`TokenEncoder`]: the external model. Turns a batch of strings into
//!   token-level vectors plus an attention mask.
//! - [`Embedder`]: text in, one fixed-length vector out per text. The
//!   [`PooledEmbedder`] adapter builds it from any `TokenEncoder` by batching
//!   the input and applying masked mean pooling.

pub mod hashed;
pub mod onnx_model;
pub mod pooled;
pub mod pooling;

pub use hashed::HashedTokenEncoder;
pub use onnx_model::OnnxTokenEncoder;
pub use pooled::PooledEmbedder;
pub use pooling::{l2_normalize, l2_normalize_rows, masked_mean_pool, POOLING_EPSILON};

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{QaError, Result};
use ndarray::{Array2, Array3};
use std::sync::Arc;
use tracing::{error, info};

/// A dense sentence embedding
pub type Embedding = Vec<f32>;

/// Token-level output of one encoder call
#[derive(Debug, Clone)]
pub struct TokenBatch {
    /// `[batch, seq_len, hidden]`
    pub token_embeddings: Array3<f32>,
    /// `[batch, seq_len]`, 1 for real tokens and 0 for padding
    pub attention_mask: Array2<i64>,
}

/// External text-to-token-vector model
pub trait TokenEncoder: Send + Sync {
    /// Encodes one chunk of texts, padded to a common sequence length.
    fn encode(&self, texts: &[String]) -> anyhow::Result<TokenBatch>;

    /// Width of each token vector
    fn hidden_size(&self) -> usize;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Text-to-vector embedder
pub trait Embedder: Send + Sync {
    /// Embeds `texts` in consecutive chunks of at most `batch_size`.
    ///
    /// Returns one vector per input, in input order. The chunking does not
    /// change the numeric result.
    fn embed(&self, texts: &[String], batch_size: usize) -> Result<Vec<Embedding>>;

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Builds the configured embedder.
///
/// Fails with [`QaError::ModelUnavailable`] if the provider cannot be
/// initialized.
pub fn load_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    info!(
        "Loading embedding provider {:?} (model: {}, {} dimensions)",
        config.provider, config.model_name, config.dimension
    );

    match config.provider {
        EmbeddingProviderKind::Onnx => {
            let encoder = OnnxTokenEncoder::new(
                config.model_name.clone(),
                &config.model_path,
                &config.tokenizer_path,
                config.dimension,
                config.max_length,
            )
            .map_err(|e| {
                error!("Failed to load ONNX embedding model: {:#}", e);
                QaError::ModelUnavailable(format!("{:#}", e))
            })?;
            Ok(Arc::new(PooledEmbedder::new(encoder)))
        }
        EmbeddingProviderKind::Hashed => {
            let encoder = HashedTokenEncoder::new(config.model_name.clone(), config.dimension)
                .map_err(|e| QaError::ModelUnavailable(format!("{:#}", e)))?;
            Ok(Arc::new(PooledEmbedder::new(encoder)))
        }
    }
}
