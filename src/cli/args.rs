//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

/// catalink - remote data catalog client
///
/// Opens entries served by a remote catalog server and manages the
/// local persist store of materialized sources.
#[derive(Parser, Debug)]
#[command(name = "catalink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CATALINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Persist store directory (overrides [store] dir)
    #[arg(long, global = true, env = "CATALINK_STORE_DIR")]
    pub store_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a remote catalog entry
    Open(OpenArgs),

    /// Manage the persist store
    Store(StoreArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the open command
#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Entry name on the catalog server
    pub entry: String,

    /// Catalog server URL (defaults to [catalog] url)
    #[arg(short, long)]
    pub url: Option<String>,

    /// User parameter (KEY=VALUE, VALUE parsed as JSON when possible)
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, Value)>,

    /// Container kind to assume if the server does not name one
    #[arg(long)]
    pub container: Option<String>,

    /// Request timeout in seconds (overrides [http] timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Add the opened source to the persist store
    #[arg(long)]
    pub persist: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the store command
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// Subcommand for store
    #[command(subcommand)]
    pub action: StoreAction,
}

/// Store subcommands
#[derive(Subcommand, Debug)]
pub enum StoreAction {
    /// List persisted sources
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the store directory
    Path,

    /// Remove every persisted source and the store directory
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse a user parameter in KEY=VALUE format
fn parse_param(s: &str) -> Result<(String, Value), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    let key = &s[..pos];
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    let raw = &s[pos + 1..];
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
