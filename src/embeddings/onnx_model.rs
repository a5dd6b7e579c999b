// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence-transformer encoder
//!
//! Runs the all-MiniLM-L6-v2 model under ONNX Runtime and returns the raw
//! token-level output `[batch, seq_len, 384]` together with the attention
//! mask. Pooling happens in [`super::PooledEmbedder`].
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - BERT tokenization with padding and truncation
//! - Model shape validated once at load time

use super::{TokenBatch, TokenEncoder};
use anyhow::{Context, Result};
use ndarray::{Array2, Ix3};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

/// ONNX-based token encoder
///
/// # Thread Safety
/// The session sits behind `Arc<Mutex>` since `Session::run` needs exclusive
/// access; the tokenizer is shared read-only.
#[derive(Clone)]
pub struct OnnxTokenEncoder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    max_length: usize,
}

impl std::fmt::Debug for OnnxTokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTokenEncoder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// Padded input tensors for one batch
struct EncodedInputs {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl OnnxTokenEncoder {
    /// Loads the model and tokenizer from disk
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - A probe inference does not produce `[batch, seq_len, dimension]`
    ///
    /// # Example
    /// ```ignore
    /// let encoder = OnnxTokenEncoder::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    ///     384,
    ///     256,
    /// )?;
    /// ```
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        dimension: usize,
        max_length: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }
        if max_length == 0 {
            anyhow::bail!("max_length must be greater than 0");
        }

        let session = Self::build_session(model_path)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let encoder = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
            max_length,
        };

        // Probe inference: the model must emit token-level [batch, seq, dimension]
        let probe = encoder
            .encode(&["validation test".to_string()])
            .context("Model validation inference failed")?;
        let hidden = probe.token_embeddings.dim().2;
        if hidden != dimension {
            anyhow::bail!(
                "Model outputs unexpected hidden size {} (expected {})",
                hidden,
                dimension
            );
        }

        info!(
            "ONNX embedding model {} loaded ({} dimensions, max {} tokens)",
            encoder.model_name, encoder.dimension, encoder.max_length
        );

        Ok(encoder)
    }

    fn build_session(model_path: &Path) -> Result<Session> {
        info!("Initializing ONNX embedding model with GPU support");

        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path);

        match cuda_result {
            Ok(session) => {
                info!("CUDA execution provider initialized");
                Ok(session)
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(4)
                    .context("Failed to set intra threads")?
                    .commit_from_file(model_path)
                    .with_context(|| {
                        format!("Failed to load ONNX model from {}", model_path.display())
                    })
            }
        }
    }

    /// Tokenizes and pads `texts` to the longest sequence in the batch
    fn tokenize_batch(&self, texts: &[String]) -> Result<EncodedInputs> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len().min(self.max_length))
            .max()
            .unwrap_or(0);

        let batch = texts.len();
        let mut input_ids = Array2::<i64>::zeros((batch, max_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, max_len));
        let token_type_ids = Array2::<i64>::zeros((batch, max_len));

        for (b, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let len = ids.len().min(self.max_length);

            for t in 0..len {
                input_ids[[b, t]] = ids[t] as i64;
                attention_mask[[b, t]] = mask[t] as i64;
            }
        }

        Ok(EncodedInputs {
            input_ids,
            attention_mask,
            token_type_ids,
        })
    }

}

impl TokenEncoder for OnnxTokenEncoder {
    fn encode(&self, texts: &[String]) -> Result<TokenBatch> {
        let inputs = self.tokenize_batch(texts)?;
        let attention_mask = inputs.attention_mask.clone();

        debug!(
            "Running ONNX inference on batch of {} (seq_len {})",
            texts.len(),
            attention_mask.ncols()
        );

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("ONNX session lock poisoned"))?;

        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(inputs.input_ids)?,
            "attention_mask" => Value::from_array(inputs.attention_mask)?,
            "token_type_ids" => Value::from_array(inputs.token_type_ids)?
        ])?;

        // Index [0] rather than name since exports differ in output naming
        let token_embeddings = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?
            .into_dimensionality::<Ix3>()
            .context("Model output is not [batch, seq_len, hidden]")?
            .to_owned();

        Ok(TokenBatch {
            token_embeddings,
            attention_mask,
        })
    }

    fn hidden_size(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
