// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Answers API: nearest-question lookup for a batch of queries

pub mod handler;
pub mod request;

pub use handler::get_answers_handler;
pub use request::GetAnswersRequest;
