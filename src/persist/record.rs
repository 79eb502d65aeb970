//! Cache records and their on-disk envelope

use crate::container::{DataSource, SourceHandle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// A registered source
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub token: String,
    pub source: SourceHandle,
    pub inserted_at: DateTime<Utc>,

    /// Record-specific TTL; overrides the store-wide setting
    pub ttl: Option<Duration>,

    /// Where this record's artifact is (or will be) written
    pub artifact: PathBuf,
}

impl CacheRecord {
    /// TTL in force for this record; zero counts as unset
    pub fn effective_ttl(&self, store_ttl: Option<Duration>) -> Option<Duration> {
        self.ttl
            .or(store_ttl)
            .filter(|ttl| !ttl.is_zero())
    }

    /// Whether the record has outlived its TTL at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, store_ttl: Option<Duration>) -> bool {
        let Some(ttl) = self.effective_ttl(store_ttl) else {
            return false;
        };
        let age = (now - self.inserted_at).to_std().unwrap_or_default();
        age >= ttl
    }
}

/// JSON document written for each record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub token: String,
    pub name: String,
    pub container: String,
    pub inserted_at: DateTime<Utc>,

    /// Record TTL in seconds, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<f64>,

    /// Identity the token was derived from
    #[serde(default)]
    pub identity: Value,

    /// The source's own durable representation
    pub payload: Value,
}

impl ArtifactEnvelope {
    pub fn from_record(record: &CacheRecord) -> Self {
        Self {
            token: record.token.clone(),
            name: record.source.name().to_string(),
            container: record.source.container().to_string(),
            inserted_at: record.inserted_at,
            ttl_secs: record.ttl.map(|ttl| ttl.as_secs_f64()),
            identity: record.source.identity(),
            payload: record.source.artifact(),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// A source known only from an artifact written by an earlier run
#[derive(Debug, Clone)]
pub struct PersistedSource {
    envelope: ArtifactEnvelope,
    description: String,
}

impl PersistedSource {
    pub fn new(envelope: ArtifactEnvelope) -> Self {
        let description = envelope
            .payload
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            envelope,
            description,
        }
    }

    pub fn envelope(&self) -> &ArtifactEnvelope {
        &self.envelope
    }
}

impl DataSource for PersistedSource {
    fn name(&self) -> &str {
        &self.envelope.name
    }

    fn container(&self) -> &str {
        &self.envelope.container
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: String) {
        self.description = description;
    }

    fn identity(&self) -> Value {
        self.envelope.identity.clone()
    }

    fn artifact(&self) -> Value {
        self.envelope.payload.clone()
    }

    fn ttl(&self) -> Option<Duration> {
        self.envelope.ttl()
    }
}
