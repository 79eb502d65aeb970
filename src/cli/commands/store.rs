//! Store command - inspect and clear the persist store

use crate::cli::args::{OutputFormat, StoreAction, StoreArgs};
use crate::config::schema::StoreConfig;
use crate::config::Config;
use crate::error::CatalinkResult;
use crate::persist::{ArtifactEnvelope, PersistStore};
use console::style;
use std::path::PathBuf;

/// Execute the store command
pub async fn execute(
    args: StoreArgs,
    config: &Config,
    store_dir: Option<PathBuf>,
) -> CatalinkResult<()> {
    let store_config = store_config(config, store_dir);

    match args.action {
        StoreAction::List { format } => list(&store_config, format).await,
        StoreAction::Path => {
            println!("{}", resolved_dir(&store_config).display());
            Ok(())
        }
        StoreAction::Clear => clear(&store_config).await,
    }
}

/// `[store]` settings with the command-line directory override applied
pub(crate) fn store_config(config: &Config, store_dir: Option<PathBuf>) -> StoreConfig {
    let mut store = config.store.clone();
    if store_dir.is_some() {
        store.dir = store_dir;
    }
    store
}

fn resolved_dir(config: &StoreConfig) -> PathBuf {
    config
        .dir
        .clone()
        .unwrap_or_else(crate::config::ConfigManager::store_dir)
}

async fn list(config: &StoreConfig, format: OutputFormat) -> CatalinkResult<()> {
    let envelopes = PersistStore::scan(&resolved_dir(config)).await?;

    if envelopes.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No persisted sources."),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&envelopes),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelopes)?),
        OutputFormat::Plain => {
            for envelope in &envelopes {
                println!("{}", envelope.token);
            }
        }
    }

    Ok(())
}

fn print_table(envelopes: &[ArtifactEnvelope]) {
    println!(
        "{:<34} {:<24} {:<12} {:<20}",
        style("TOKEN").bold(),
        style("NAME").bold(),
        style("CONTAINER").bold(),
        style("PERSISTED").bold()
    );
    println!("{}", "-".repeat(90));

    for envelope in envelopes {
        println!(
            "{:<34} {:<24} {:<12} {:<20}",
            envelope.token,
            envelope.name,
            envelope.container,
            envelope.inserted_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Total: {} source(s)", envelopes.len());
}

async fn clear(config: &StoreConfig) -> CatalinkResult<()> {
    let store = PersistStore::from_config(config).await?;
    store.clear();
    store.flush().await;

    if store.disk_failures() > 0 {
        println!(
            "{} Could not remove {}",
            style("[WARN]").yellow(),
            store.dir().display()
        );
    } else {
        println!(
            "{} Cleared {}",
            style("[OK]").green(),
            store.dir().display()
        );
    }
    Ok(())
}
