//! The `fix` subcommand: run one mutation request end to end.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Map;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::models::{Config, MutationOutcome};
use crate::infrastructure::document;
use crate::infrastructure::llm::AnthropicClient;
use crate::services::{CacheService, GenerationContext, MutationOrchestrator, MutationRequest};

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Specification file to fix (JSON or YAML).
    pub file: PathBuf,

    /// Natural-language description of the fix.
    #[arg(long, short)]
    pub prompt: Option<String>,

    /// Rule id driving the fix (e.g. security-missing-auth).
    #[arg(long)]
    pub rule: Option<String>,

    /// Path item the fix targets (e.g. /pets/{id}).
    #[arg(long)]
    pub target_path: Option<String>,

    /// HTTP method the fix targets.
    #[arg(long)]
    pub target_method: Option<String>,

    /// Validator message to resolve. Repeatable.
    #[arg(long = "validation-error")]
    pub validation_errors: Vec<String>,

    /// JSON Pointer narrowing the part of the document sent to the model.
    #[arg(long)]
    pub context_path: Option<String>,

    /// Skip the decision heuristic and regenerate the whole document.
    #[arg(long)]
    pub force_regeneration: bool,

    /// Write the updated document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Print cache statistics after the run.
    #[arg(long)]
    pub stats: bool,
}

pub async fn execute(
    args: FixArgs,
    config: &Config,
    cache: Arc<CacheService>,
    json: bool,
) -> Result<()> {
    if args.prompt.is_none() && args.validation_errors.is_empty() && args.rule.is_none() {
        bail!("nothing to do: provide --prompt, --rule, or --validation-error");
    }

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let (doc, format) = document::parse(&raw)?;

    let llm = Arc::new(AnthropicClient::new(&config.llm)?);
    let orchestrator = MutationOrchestrator::new(llm, Arc::clone(&cache), &config.llm);

    let request = MutationRequest {
        document: doc,
        prompt: args.prompt.clone().unwrap_or_default(),
        rule_id: args.rule.clone(),
        context: GenerationContext {
            path: args.context_path.clone(),
            extra: Map::new(),
        },
        validation_errors: args.validation_errors.clone(),
        target_path: args.target_path.clone(),
        target_method: args.target_method.clone(),
        force_regeneration: args.force_regeneration,
    };

    let report = orchestrator.execute(request).await?;

    if let MutationOutcome::Failed { error } = &report.outcome {
        bail!("mutation failed: {error}");
    }

    let updated = report
        .outcome
        .result_document()
        .context("no result document in outcome")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let rendered = document::serialize(updated, format)?;
        match &args.output {
            Some(path) => {
                std::fs::write(path, &rendered)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                eprintln!("wrote {}", path.display());
            }
            None => println!("{rendered}"),
        }
        eprintln!(
            "method: {} | decision: {} | {} ms{}",
            report.method_used,
            report.decision.reasoning,
            report.processing_time_ms,
            if report.cached { " (cached)" } else { "" }
        );
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    }

    if args.stats {
        let stats = cache.stats_all().await;
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
