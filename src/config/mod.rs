// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Node configuration
//!
//! Loaded in three layers: built-in defaults, an optional TOML file, then
//! environment variable overrides.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [embedding]
//! provider = "onnx"
//! model_path = "./models/all-MiniLM-L6-v2-onnx/model.onnx"
//! tokenizer_path = "./models/all-MiniLM-L6-v2-onnx/tokenizer.json"
//! batch_size = 32
//!
//! [limits]
//! max_queries = 256
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "QA_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Which embedding backend to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// all-MiniLM-L6-v2 under ONNX Runtime
    Onnx,
    /// Deterministic word-hash vectors, no model files needed
    Hashed,
}

impl FromStr for EmbeddingProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "hashed" => Ok(Self::Hashed),
            other => Err(anyhow!(
                "unknown embedding provider '{}' (expected 'onnx' or 'hashed')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model_name: String,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Output dimension (384 for all-MiniLM-L6-v2)
    pub dimension: usize,
    /// Maximum tokens per text before truncation
    pub max_length: usize,
    /// Default chunk size for embedding calls
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Onnx,
            model_name: "all-MiniLM-L6-v2".to_string(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2-onnx/model.onnx"),
            tokenizer_path: PathBuf::from("./models/all-MiniLM-L6-v2-onnx/tokenizer.json"),
            dimension: 384,
            max_length: 256,
            batch_size: 32,
        }
    }
}

/// Request size limits enforced at the HTTP boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_context_entries: usize,
    pub max_queries: usize,
    /// Maximum length of a single text, in bytes
    pub max_text_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_context_entries: 10_000,
            max_queries: 256,
            max_text_length: 8192,
        }
    }
}

impl NodeConfig {
    /// Parses a TOML file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, then `path` (or `$QA_CONFIG_PATH`) if given, then env
    /// overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("API_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("API_PORT") {
            self.server.port = parse_var("API_PORT", &val)?;
        }
        if let Some(val) = lookup("EMBEDDING_PROVIDER") {
            self.embedding.provider = val.parse()?;
        }
        if let Some(val) = lookup("EMBEDDING_MODEL_NAME") {
            self.embedding.model_name = val;
        }
        if let Some(val) = lookup("EMBEDDING_MODEL_PATH") {
            self.embedding.model_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("EMBEDDING_TOKENIZER_PATH") {
            self.embedding.tokenizer_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("EMBEDDING_DIMENSION") {
            self.embedding.dimension = parse_var("EMBEDDING_DIMENSION", &val)?;
        }
        if let Some(val) = lookup("EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = parse_var("EMBEDDING_BATCH_SIZE", &val)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be greater than 0");
        }
        if self.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be greater than 0");
        }
        if self.embedding.max_length == 0 {
            anyhow::bail!("embedding.max_length must be greater than 0");
        }
        if self.limits.max_queries == 0 || self.limits.max_text_length == 0 {
            anyhow::bail!("limits.max_queries and limits.max_text_length must be greater than 0");
        }
        if self.limits.max_context_entries == 0 {
            warn!("limits.max_context_entries is 0: only empty contexts will be accepted");
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {}: '{}'", key, value))
}
