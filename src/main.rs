//! Specmend CLI entry point.

use clap::Parser;
use std::sync::Arc;

use specmend::cli::{Cli, Commands};
use specmend::infrastructure::config::ConfigLoader;
use specmend::infrastructure::logging;
use specmend::services::CacheService;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => specmend::cli::handle_error(&err, cli.json),
    };

    if let Err(err) = logging::init(&config.logging) {
        specmend::cli::handle_error(&err, cli.json);
    }

    // The cache lives here, owned by the entry point, and is handed to
    // consumers by reference. No ambient global instance exists.
    let cache = Arc::new(CacheService::new(&config.cache));

    let result = match cli.command {
        Commands::Fix(args) => {
            specmend::cli::commands::fix::execute(args, &config, cache, cli.json).await
        }
        Commands::Decide(args) => specmend::cli::commands::decide::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        specmend::cli::handle_error(&err, cli.json);
    }
}
