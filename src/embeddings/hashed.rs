// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Deterministic hashed token encoder
//!
//! A model-free [`TokenEncoder`]: each lowercase word is mapped to a
//! pseudo-random vector seeded by its BLAKE3 hash. Texts sharing words
//! therefore land close together after mean pooling, which is enough for
//! tests, benchmarks and deployments without the ONNX model files.
//!
//! The vectors depend only on the token bytes, so they are stable across
//! builds, platforms and compiler releases.

use super::{TokenBatch, TokenEncoder};
use anyhow::{anyhow, Result};
use ndarray::{Array2, Array3};

/// Token used to fill padded positions
const PAD_TOKEN: &str = "[PAD]";

#[derive(Debug, Clone)]
pub struct HashedTokenEncoder {
    model_name: String,
    dimension: usize,
}

impl HashedTokenEncoder {
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }
        Ok(Self {
            model_name: model_name.into(),
            dimension,
        })
    }

    /// Splits text into lowercase alphanumeric words
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// First 8 bytes of the token's BLAKE3 digest, little-endian
    fn seed(token: &str) -> u64 {
        let digest = blake3::hash(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Writes the vector for `token` into `out`.
    fn token_vector(token: &str, out: &mut [f32]) {
        let mut state = Self::seed(token);

        for value in out.iter_mut() {
            // SplitMix64
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;

            // Top 24 bits -> [-1, 1]
            let unit = (z >> 40) as f32 / (1u64 << 24) as f32;
            *value = unit * 2.0 - 1.0;
        }
    }
}

impl TokenEncoder for HashedTokenEncoder {
    fn encode(&self, texts: &[String]) -> Result<TokenBatch> {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| Self::tokenize(t)).collect();
        let max_len = tokenized.iter().map(Vec::len).max().unwrap_or(0);

        let mut pad = vec![0.0f32; self.dimension];
        Self::token_vector(PAD_TOKEN, &mut pad);

        let mut token_embeddings = Array3::<f32>::zeros((texts.len(), max_len, self.dimension));
        let mut attention_mask = Array2::<i64>::zeros((texts.len(), max_len));
        let mut buffer = vec![0.0f32; self.dimension];

        for (b, tokens) in tokenized.iter().enumerate() {
            for t in 0..max_len {
                let values = match tokens.get(t) {
                    Some(token) => {
                        Self::token_vector(token, &mut buffer);
                        attention_mask[[b, t]] = 1;
                        &buffer
                    }
                    None => &pad,
                };
                for (d, v) in values.iter().enumerate() {
                    token_embeddings[[b, t, d]] = *v;
                }
            }
        }

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
