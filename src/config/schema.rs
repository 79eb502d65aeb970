//! Configuration schema for catalink
//!
//! Configuration is stored at `~/.config/catalink/config.toml`

use crate::remote::HttpArgs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default catalog server and entry settings
    pub catalog: CatalogConfig,

    /// Global HTTP settings (lowest precedence)
    pub http: HttpArgs,

    /// Persist store settings
    pub store: StoreConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Catalog server settings applied to every entry opened from the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Server address (`http://`, `https://` or `intake://`)
    pub url: Option<String>,

    /// Container kind assumed when the server does not name one
    pub container: Option<String>,

    /// Entries per listing page for nested catalogs
    pub page_size: Option<u64>,

    /// Allow environment expansion in nested catalog defaults
    pub getenv: bool,

    /// Allow shell expansion in nested catalog defaults
    pub getshell: bool,

    /// Auth headers sent with every request (entry level)
    pub headers: BTreeMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            container: None,
            page_size: None,
            getenv: true,
            getshell: true,
            headers: BTreeMap::new(),
        }
    }
}

/// Persist store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store directory (defaults to the user cache directory)
    pub dir: Option<PathBuf>,

    /// Store-wide TTL in seconds (0 = records never go stale)
    pub ttl_secs: u64,
}

impl StoreConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}
