//! Open command - resolve a remote entry and build its source

use crate::cli::args::{OpenArgs, OutputFormat};
use crate::cli::commands::store::store_config;
use crate::config::Config;
use crate::container::{builtin_containers, DataSource, PluginRegistry, SourceHandle};
use crate::entry::{OpenContext, RemoteEntry};
use crate::error::{CatalinkError, CatalinkResult};
use crate::persist::PersistStore;
use crate::remote::{HeaderAuth, HttpArgs};
use console::style;
use serde_json::Map;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Execute the open command
pub async fn execute(
    args: OpenArgs,
    config: &Config,
    store_dir: Option<PathBuf>,
) -> CatalinkResult<()> {
    let url = args
        .url
        .clone()
        .or_else(|| config.catalog.url.clone())
        .ok_or_else(|| CatalinkError::InvalidUrl(String::new()))?;

    let mut entry = RemoteEntry::new(url, &args.entry)
        .with_auth(Arc::new(HeaderAuth::new(config.catalog.headers.clone())))
        .with_page_size(config.catalog.page_size)
        .with_expansion(config.catalog.getenv, config.catalog.getshell);
    if let Some(container) = args.container.clone().or_else(|| config.catalog.container.clone()) {
        entry = entry.with_container(container);
    }

    let parameters: Map<_, _> = args.params.into_iter().collect();
    let mut call = HttpArgs::new();
    call.timeout_secs = args.timeout;
    let defaults = config.http.clone();

    debug!("Opening {} from {}", entry.name(), entry.url());
    let source = tokio::task::spawn_blocking(move || {
        let plugins = PluginRegistry::new();
        let containers = builtin_containers();
        let ctx = OpenContext {
            plugins: &plugins,
            containers: &containers,
            defaults: &defaults,
        };
        entry.open_with(parameters, &call, ctx)
    })
    .await
    .map_err(|e| CatalinkError::Internal(format!("open task failed: {}", e)))??;

    let source: SourceHandle = Arc::from(source);
    match args.format {
        OutputFormat::Table => print_table(source.as_ref()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&source.artifact())?),
        OutputFormat::Plain => println!("{}", source.name()),
    }

    if args.persist {
        let store = PersistStore::from_config(&store_config(config, store_dir)).await?;
        let token = store.add_source(Arc::clone(&source));
        store.flush().await;
        if store.disk_failures() > 0 {
            warn!("Source registered but its artifact could not be written");
        }
        match args.format {
            OutputFormat::Table => println!(
                "{} persisted as {}",
                style("[OK]").green(),
                style(&token).cyan()
            ),
            _ => eprintln!("{}", token),
        }
    }

    Ok(())
}

fn print_table(source: &dyn DataSource) {
    let artifact = source.artifact();
    println!("{:<12} {}", style("NAME").bold(), source.name());
    println!("{:<12} {}", style("CONTAINER").bold(), source.container());
    if !source.description().is_empty() {
        println!("{:<12} {}", style("DESCRIPTION").bold(), source.description());
    }
    if let Some(fields) = artifact.get("fields").and_then(|f| f.as_object()) {
        for (key, value) in fields {
            println!("{:<12} {}", style(key.to_uppercase()).dim(), value);
        }
    }
}
