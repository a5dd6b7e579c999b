// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! QaService retrieval tests
//!
//! Run against the hashed encoder, so no model files are needed. Shared
//! words between questions produce high cosine similarity.

use fabstir_qa_node::embeddings::{Embedder, HashedTokenEncoder, PooledEmbedder};
use fabstir_qa_node::{QaError, QaService, QueryResult};
use std::sync::Arc;

fn hashed_service() -> QaService {
    let encoder = HashedTokenEncoder::new("hashed-test", 384).unwrap();
    QaService::new(Arc::new(PooledEmbedder::new(encoder)))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_club_scenario() {
    let service = hashed_service();
    service
        .set_context(
            strings(&["How many club members are there?", "What days are most games played?"]),
            strings(&["20", "Saturday"]),
        )
        .await
        .unwrap();

    let results = service
        .get_answers(strings(&["Which days have the most events played at?"]), Some(1))
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![QueryResult {
            original_question: "Which days have the most events played at?".to_string(),
            matched_question: "What days are most games played?".to_string(),
            matched_answer: "Saturday".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_verbatim_question_scores_highest() {
    let encoder = HashedTokenEncoder::new("hashed-test", 384).unwrap();
    let embedder = PooledEmbedder::new(encoder);
    let questions = strings(&[
        "where is the library",
        "when does the library open",
        "how do I renew a book",
        "can I bring food inside",
    ]);

    // Self-similarity of every question is ~1 and beats all other entries
    let vectors = embedder.embed(&questions, 2).unwrap();
    let normalized: Vec<Vec<f32>> = vectors
        .iter()
        .map(|v| {
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            v.iter().map(|x| x / norm).collect()
        })
        .collect();
    for (i, a) in normalized.iter().enumerate() {
        let self_score: f32 = a.iter().map(|x| x * x).sum();
        assert!((self_score - 1.0).abs() < 1e-5);
        for (j, b) in normalized.iter().enumerate() {
            if i != j {
                let score: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                assert!(score < self_score, "entry {} outscored itself via {}", i, j);
            }
        }
    }

    let service = hashed_service();
    let answers = strings(&["a0", "a1", "a2", "a3"]);
    service.set_context(questions.clone(), answers.clone()).await.unwrap();

    let results = service.get_answers(questions.clone(), None).await.unwrap();
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.matched_question, questions[i]);
        assert_eq!(result.matched_answer, answers[i]);
    }
}

#[tokio::test]
async fn test_order_preserved_across_batch_sizes() {
    let service = hashed_service();
    service
        .set_context(
            strings(&["cats and kittens", "dogs and puppies", "fish in tanks"]),
            strings(&["cat", "dog", "fish"]),
        )
        .await
        .unwrap();

    let queries = strings(&[
        "tanks of fish",
        "kittens",
        "puppies and dogs",
        "fish",
        "cats",
    ]);

    for batch_size in [1, 2, 3, 5, 100] {
        let results = service.get_answers(queries.clone(), Some(batch_size)).await.unwrap();
        let originals: Vec<&str> = results.iter().map(|r| r.original_question.as_str()).collect();
        let answers: Vec<&str> = results.iter().map(|r| r.matched_answer.as_str()).collect();

        assert_eq!(originals, queries.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(answers, vec!["fish", "cat", "dog", "fish", "cat"], "batch size {}", batch_size);
    }
}

#[tokio::test]
async fn test_duplicate_entries_resolve_to_lowest_index() {
    let service = hashed_service();
    service
        .set_context(
            strings(&["unrelated topic", "parking near venue", "parking near venue"]),
            strings(&["x", "first", "second"]),
        )
        .await
        .unwrap();

    for _ in 0..5 {
        let results = service
            .get_answers(strings(&["parking near the venue"]), Some(1))
            .await
            .unwrap();
        assert_eq!(results[0].matched_answer, "first");
    }
}

#[tokio::test]
async fn test_empty_string_query_is_scored_not_rejected() {
    let service = hashed_service();
    service
        .set_context(strings(&["alpha", "beta"]), strings(&["a", "b"]))
        .await
        .unwrap();

    // All-padding input pools to the zero vector: every score is 0, so the
    // first entry wins the tie
    let results = service
        .get_answers(strings(&["", "beta"]), Some(2))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].original_question, "");
    assert_eq!(results[0].matched_answer, "a");
    assert_eq!(results[1].matched_answer, "b");
}

#[tokio::test]
async fn test_zero_batch_size_query_rejected() {
    let service = hashed_service();
    service
        .set_context(strings(&["alpha"]), strings(&["a"]))
        .await
        .unwrap();

    let err = service
        .get_answers(strings(&["alpha"]), Some(0))
        .await
        .unwrap_err();
    assert_eq!(err, QaError::InvalidBatchSize(0));
}
