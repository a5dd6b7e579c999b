// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response type for POST /v1/context

use serde::{Deserialize, Serialize};

/// Acknowledgment returned once the new context is active
///
/// ```json
/// { "status": "ok", "contextSize": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContextResponse {
    pub status: String,
    pub context_size: usize,
}

impl SetContextResponse {
    pub fn ok(context_size: usize) -> Self {
        Self {
            status: "ok".to_string(),
            context_size,
        }
    }
}
