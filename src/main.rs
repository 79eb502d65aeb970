//! catalink - remote data catalog client
//!
//! CLI entry point that dispatches to subcommands.

use catalink::cli::{Cli, Commands};
use catalink::config::ConfigManager;
use catalink::error::CatalinkResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CatalinkResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("catalink=warn"),
        1 => EnvFilter::new("catalink=info"),
        _ => EnvFilter::new("catalink=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Open(args) => catalink::cli::commands::open(args, &config, cli.store_dir).await,
        Commands::Store(args) => catalink::cli::commands::store(args, &config, cli.store_dir).await,
        Commands::Config(args) => catalink::cli::commands::config(args, &config, cli.config).await,
    }
}
