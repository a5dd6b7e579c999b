// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Offline command-line tools
//!
//! `ask` answers questions against a context file without starting the
//! HTTP server; `check-config` prints the effective configuration.

use crate::api::SetContextRequest;
use crate::config::NodeConfig;
use crate::embeddings::load_embedder;
use crate::retrieval::{QaService, QueryResult};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fabstir QA Node CLI
#[derive(Parser, Debug)]
#[command(name = "fabstir-qa-cli")]
#[command(version)]
#[command(about = "CLI tools for the Fabstir QA node", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "QA_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer questions against a context file
    Ask(AskArgs),

    /// Load, validate and print the configuration
    CheckConfig,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// JSON file of the form {"questions": [...], "answers": [...]}
    #[arg(long)]
    pub context: PathBuf,

    /// Question to answer (repeatable)
    #[arg(long = "question", short = 'q', required = true)]
    pub questions: Vec<String>,

    /// Embedding chunk size
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    dotenv::dotenv().ok();
    let config = NodeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ask(args) => {
            let results = ask(&config, args).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

/// Reads a context file in the `POST /v1/context` body format.
pub fn read_context_file(path: &Path) -> Result<SetContextRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse context file {}", path.display()))
}

pub async fn ask(config: &NodeConfig, args: AskArgs) -> Result<Vec<QueryResult>> {
    let context = read_context_file(&args.context)?;
    context
        .validate(&config.limits)
        .map_err(|e| anyhow::anyhow!("Invalid context file: {}", e))?;

    let embedder = load_embedder(&config.embedding)?;
    let service = QaService::new(embedder).with_default_batch_size(config.embedding.batch_size)?;

    info!(
        "Loaded {} context entries from {}",
        context.questions.len(),
        args.context.display()
    );
    service
        .set_context(context.questions, context.answers)
        .await?;

    Ok(service.get_answers(args.questions, args.batch_size).await?)
}
