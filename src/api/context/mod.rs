// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Context API: replace and inspect the active reference set

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{context_info_handler, set_context_handler};
pub use request::SetContextRequest;
pub use response::SetContextResponse;
