//! HTTP request settings passed through to the transport

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Headers and timeout applied to catalog requests
///
/// Settings exist at three levels: the global `[http]` config section,
/// the entry, and the individual call. Layers are combined with
/// [`HttpArgs::merged`], where the more specific layer wins per header
/// and for the timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpArgs {
    /// Extra request headers
    pub headers: BTreeMap<String, String>,

    /// Whole-request deadline in seconds (unset = no deadline)
    pub timeout_secs: Option<u64>,
}

impl HttpArgs {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a single header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add or replace several headers
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the request deadline
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Layer `overrides` on top of `self`
    pub fn merged(&self, overrides: &HttpArgs) -> HttpArgs {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        HttpArgs {
            headers,
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Deadline as a `Duration`; zero means none
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_prefers_overrides() {
        let global = HttpArgs::new()
            .with_header("User-Agent", "catalink")
            .with_header("X-Team", "data")
            .with_timeout_secs(30);
        let entry = HttpArgs::new().with_header("X-Team", "ml");

        let merged = global.merged(&entry);
        assert_eq!(merged.headers["User-Agent"], "catalink");
        assert_eq!(merged.headers["X-Team"], "ml");
        assert_eq!(merged.timeout_secs, Some(30));
    }

    #[test]
    fn call_level_timeout_wins() {
        let entry = HttpArgs::new().with_timeout_secs(30);
        let call = HttpArgs::new().with_timeout_secs(5);
        assert_eq!(entry.merged(&call).timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_timeout_is_disabled() {
        assert_eq!(HttpArgs::new().with_timeout_secs(0).timeout(), None);
        assert_eq!(HttpArgs::new().timeout(), None);
    }

    #[test]
    fn deserializes_from_toml() {
        let args: HttpArgs = toml::from_str(
            r#"
            timeout_secs = 10
            [headers]
            Authorization = "Bearer abc"
        "#,
        )
        .unwrap();
        assert_eq!(args.timeout_secs, Some(10));
        assert_eq!(args.headers["Authorization"], "Bearer abc");
    }
}
