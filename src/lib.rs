// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Fabstir QA Node - answers questions by nearest-neighbour lookup
//!
//! ```text
//! context:  questions -> Embedder -> normalize -> ContextIndex
//!                                                     |
//! query:    questions -> Embedder -> normalize -> best_match -> answers
//! ```
//!
//! No text is generated: every answer is one of the answers supplied with
//! the context, chosen by cosine similarity of the questions.

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod retrieval;

pub use error::{QaError, Result};
pub use retrieval::{ContextInfo, ContextState, QaService, QueryResult};
