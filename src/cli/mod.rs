//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "specmend",
    about = "AI-assisted OpenAPI document repair",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON output.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply an AI-assisted fix to a specification file.
    Fix(commands::fix::FixArgs),
    /// Dry-run the patch-vs-regeneration decision for a request.
    Decide(commands::decide::DecideArgs),
}

/// Print a terminal error and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({"error": err.to_string()});
        eprintln!("{payload}");
    } else {
        eprintln!("error: {err:#}");
    }
    std::process::exit(1);
}
