// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Context index
//!
//! Holds the active question/answer pairs and their L2-normalized
//! embeddings. Cosine similarity against a normalized query reduces to a
//! dot product per stored row.

use crate::embeddings::{l2_normalize_rows, Embedding};
use crate::error::{QaError, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// Scoring seam over a set of stored vectors
///
/// [`DenseIndex`] scans every row; an approximate structure can implement
/// the same trait without changing the retriever.
pub trait VectorIndex: Send + Sync {
    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension
    fn dimension(&self) -> usize;

    /// Similarity of `query` against every stored vector, in storage order
    fn scores(&self, query: ArrayView1<'_, f32>) -> Vec<f32>;

    /// Index and score of the most similar stored vector.
    ///
    /// Exact ties resolve to the lowest index. NaN scores are skipped, so
    /// this returns `None` when the index is empty or every score is NaN.
    fn best_match(&self, query: ArrayView1<'_, f32>) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, score) in self.scores(query).into_iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }
        best
    }
}

/// Brute-force index over a dense matrix of normalized rows
#[derive(Debug, Clone)]
pub struct DenseIndex {
    vectors: Array2<f32>,
}

impl DenseIndex {
    /// Builds an index from raw embeddings, normalizing each row.
    ///
    /// All embeddings must have length `dimension`.
    pub fn from_embeddings(embeddings: Vec<Embedding>, dimension: usize) -> Result<Self> {
        let rows = embeddings.len();
        let mut flat = Vec::with_capacity(rows * dimension);
        for (i, embedding) in embeddings.into_iter().enumerate() {
            if embedding.len() != dimension {
                return Err(QaError::EmbeddingFailure(format!(
                    "embedding {} has dimension {} (expected {})",
                    i,
                    embedding.len(),
                    dimension
                )));
            }
            flat.extend(embedding);
        }

        let mut vectors = Array2::from_shape_vec((rows, dimension), flat)
            .map_err(|e| QaError::EmbeddingFailure(e.to_string()))?;
        l2_normalize_rows(&mut vectors);

        if let Some(row) = vectors
            .outer_iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
        {
            return Err(QaError::EmbeddingFailure(format!(
                "embedding {} contains NaN or infinite values",
                row
            )));
        }

        Ok(Self { vectors })
    }

    /// Normalized stored vectors, one row per entry
    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }
}

impl VectorIndex for DenseIndex {
    fn len(&self) -> usize {
        self.vectors.nrows()
    }

    fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    fn scores(&self, query: ArrayView1<'_, f32>) -> Vec<f32> {
        // Row-wise so identical rows always produce bit-identical scores
        self.vectors
            .axis_iter(Axis(0))
            .map(|row| row.dot(&query))
            .collect()
    }
}

/// The active reference set: parallel questions, answers and vectors
#[derive(Debug, Clone)]
pub struct ContextIndex {
    questions: Vec<String>,
    answers: Vec<String>,
    vectors: DenseIndex,
}

impl ContextIndex {
    /// Assembles an index; `embeddings` are normalized here.
    ///
    /// Fails with `ShapeMismatch` if questions and answers differ in length,
    /// and with `EmbeddingFailure` if the embedding count or widths are off.
    pub fn new(
        questions: Vec<String>,
        answers: Vec<String>,
        embeddings: Vec<Embedding>,
        dimension: usize,
    ) -> Result<Self> {
        if questions.len() != answers.len() {
            return Err(QaError::ShapeMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }
        if embeddings.len() != questions.len() {
            return Err(QaError::EmbeddingFailure(format!(
                "{} embeddings for {} questions",
                embeddings.len(),
                questions.len()
            )));
        }

        let vectors = DenseIndex::from_embeddings(embeddings, dimension)?;
        Ok(Self {
            questions,
            answers,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn vectors(&self) -> &DenseIndex {
        &self.vectors
    }

    /// Question/answer pair at `index`
    pub fn entry(&self, index: usize) -> Option<(&str, &str)> {
        Some((
            self.questions.get(index)?.as_str(),
            self.answers.get(index)?.as_str(),
        ))
    }
}
