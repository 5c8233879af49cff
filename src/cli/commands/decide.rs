//! The `decide` subcommand: dry-run the decision heuristic.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::domain::models::FixRequest;
use crate::infrastructure::document;
use crate::services::DecisionEngine;

#[derive(Debug, Args)]
pub struct DecideArgs {
    /// Specification file the request would run against (JSON or YAML).
    pub file: PathBuf,

    /// Natural-language description of the fix.
    #[arg(long, short)]
    pub prompt: Option<String>,

    /// Path item the fix targets.
    #[arg(long)]
    pub target_path: Option<String>,

    /// HTTP method the fix targets.
    #[arg(long)]
    pub target_method: Option<String>,

    /// Validator message to resolve. Repeatable.
    #[arg(long = "validation-error")]
    pub validation_errors: Vec<String>,

    /// Force full regeneration.
    #[arg(long)]
    pub force_regeneration: bool,
}

pub async fn execute(args: DecideArgs, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let (doc, _) = document::parse(&raw)?;
    let document_size_bytes = serde_json::to_string(&doc)?.len();

    let request = FixRequest {
        validation_errors: args.validation_errors,
        target_path: args.target_path,
        target_method: args.target_method,
        prompt: args.prompt.unwrap_or_default(),
        document_size_bytes,
        force_regeneration: args.force_regeneration,
    };

    let decision = DecisionEngine::new().decide(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!(
            "{}: {}",
            if decision.use_patches {
                "patch"
            } else {
                "full_regeneration"
            },
            decision.reasoning
        );
    }
    Ok(())
}
