// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pooling and normalization over token-level model output
//!
//! Sentence transformers emit one vector per token. A sentence embedding is
//! obtained by averaging the token vectors that the attention mask marks as
//! real (mask = 1), ignoring the padding added to equalize sequence lengths.

use ndarray::{Array2, ArrayView2, ArrayView3, ArrayViewMut1, Axis};

/// Floor for the valid-token count, so an all-padding row pools to zero
/// instead of NaN.
pub const POOLING_EPSILON: f32 = 1e-9;

/// Masked mean pooling
///
/// # Arguments
/// - `token_embeddings`: `[batch, seq_len, hidden]` token vectors
/// - `attention_mask`: `[batch, seq_len]`, 1 for real tokens, 0 for padding
///
/// # Returns
/// `[batch, hidden]` sentence embeddings
///
/// The caller guarantees the first two axes of both arrays agree.
pub fn masked_mean_pool(
    token_embeddings: ArrayView3<'_, f32>,
    attention_mask: ArrayView2<'_, i64>,
) -> Array2<f32> {
    let (batch, seq_len, hidden) = token_embeddings.dim();
    let mut pooled = Array2::<f32>::zeros((batch, hidden));

    for (b, mut row) in pooled.axis_iter_mut(Axis(0)).enumerate() {
        let item = token_embeddings.index_axis(Axis(0), b);
        let mut sum_mask = 0.0f32;

        for t in 0..seq_len {
            let mask_value = attention_mask[[b, t]] as f32;
            if mask_value == 0.0 {
                continue;
            }
            sum_mask += mask_value;
            row.scaled_add(mask_value, &item.index_axis(Axis(0), t));
        }

        let denom = sum_mask.max(POOLING_EPSILON);
        row.mapv_inplace(|v| v / denom);
    }

    pooled
}

/// L2-normalizes a vector in place.
///
/// A zero-norm vector is left untouched. Finite vectors whose squared norm
/// overflows `f32` are rescaled by their largest component first.
pub fn l2_normalize(mut vector: ArrayViewMut1<'_, f32>) {
    let mut norm = vector.dot(&vector).sqrt();
    if norm.is_infinite() {
        let max_abs = vector.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if max_abs.is_finite() {
            vector.mapv_inplace(|v| v / max_abs);
            norm = vector.dot(&vector).sqrt();
        }
    }
    if norm > 0.0 {
        vector.mapv_inplace(|v| v / norm);
    }
}

/// L2-normalizes every row of a matrix in place.
pub fn l2_normalize_rows(matrix: &mut Array2<f32>) {
    for row in matrix.axis_iter_mut(Axis(0)) {
        l2_normalize(row);
    }
}
