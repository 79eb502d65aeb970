//! Token-indexed persist store

use crate::config::schema::StoreConfig;
use crate::config::ConfigManager;
use crate::container::{DataSource, SourceHandle};
use crate::error::{CatalinkError, CatalinkResult};
use crate::persist::record::{ArtifactEnvelope, CacheRecord, PersistedSource};
use crate::persist::token::token_of;
use crate::persist::worker::{DiskOp, DiskQueue};
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Artifact file extension
const ARTIFACT_EXT: &str = "json";

#[derive(Debug, Default)]
struct Index {
    records: BTreeMap<String, CacheRecord>,
    ttl: Option<Duration>,
}

/// Cache of materialized sources keyed by token
///
/// Every mutation updates the in-memory index and queues its disk work
/// under one lock, so the directory always converges to the index.
/// Each token owns exactly one artifact, `{dir}/{token}.json`; adding a
/// token twice keeps the later record and atomically replaces the
/// earlier artifact.
#[derive(Debug)]
pub struct PersistStore {
    dir: PathBuf,
    index: Mutex<Index>,
    disk: DiskQueue,
}

impl PersistStore {
    /// Open the store rooted at `dir`
    ///
    /// Artifacts left by earlier runs are registered again with their
    /// original insertion time. The directory is not created until the
    /// first record is persisted. Fails outside a Tokio runtime.
    pub async fn open(dir: impl Into<PathBuf>) -> CatalinkResult<Self> {
        let dir = dir.into();
        let disk = DiskQueue::spawn()?;

        let mut records = BTreeMap::new();
        for envelope in Self::scan(&dir).await? {
            let artifact = artifact_path(&dir, &envelope.token);
            let record = CacheRecord {
                token: envelope.token.clone(),
                inserted_at: envelope.inserted_at,
                ttl: envelope.ttl(),
                source: Arc::new(PersistedSource::new(envelope)),
                artifact,
            };
            records.insert(record.token.clone(), record);
        }
        if !records.is_empty() {
            debug!("Loaded {} record(s) from {}", records.len(), dir.display());
        }

        Ok(Self {
            dir,
            index: Mutex::new(Index { records, ttl: None }),
            disk,
        })
    }

    /// Open a store from the `[store]` config section
    pub async fn from_config(config: &StoreConfig) -> CatalinkResult<Self> {
        let dir = config
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::store_dir);
        let store = Self::open(dir).await?;
        store.set_ttl(config.ttl());
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store-wide TTL
    pub fn ttl(&self) -> Option<Duration> {
        self.index().ttl
    }

    /// Change the store-wide TTL; zero or `None` disables staleness
    pub fn set_ttl(&self, ttl: Option<Duration>) {
        self.index().ttl = ttl;
    }

    /// Token for `source`, whether or not it is registered
    pub fn get_tok(&self, source: &dyn DataSource) -> String {
        token_of(source)
    }

    /// Register `source` under `token`, replacing any existing record
    pub fn add(&self, token: impl Into<String>, source: SourceHandle) {
        let token = token.into();
        let mut index = self.index();

        let record = CacheRecord {
            artifact: artifact_path(&self.dir, &token),
            token: token.clone(),
            ttl: source.ttl(),
            source,
            inserted_at: Utc::now(),
        };

        match serde_json::to_vec_pretty(&ArtifactEnvelope::from_record(&record)) {
            Ok(bytes) => self.disk.send(DiskOp::Write {
                path: record.artifact.clone(),
                bytes,
            }),
            Err(e) => {
                warn!("Failed to serialize artifact for {}: {}", token, e);
                self.disk.record_failure();
            }
        }

        // The write replaces the superseded artifact in place
        if index.records.insert(token.clone(), record).is_some() {
            debug!("Replacing record {}", token);
        }
        debug!("Added record {}", token);
    }

    /// Register `source` under its own token and return the token
    pub fn add_source(&self, source: SourceHandle) -> String {
        let token = token_of(source.as_ref());
        self.add(token.clone(), source);
        token
    }

    pub fn get(&self, token: &str) -> Option<SourceHandle> {
        self.index()
            .records
            .get(token)
            .map(|record| record.source.clone())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index().records.contains_key(token)
    }

    /// Artifact path of a registered token
    pub fn artifact(&self, token: &str) -> Option<PathBuf> {
        self.index()
            .records
            .get(token)
            .map(|record| record.artifact.clone())
    }

    /// Whether the persisted copy of `source` has outlived its TTL
    ///
    /// Unregistered sources never need a refresh.
    pub fn needs_refresh(&self, source: &dyn DataSource) -> bool {
        let token = token_of(source);
        let index = self.index();
        index
            .records
            .get(&token)
            .is_some_and(|record| record.is_stale(Utc::now(), index.ttl))
    }

    /// Unregister `source`; returns whether it was registered
    pub fn remove(&self, source: &dyn DataSource) -> bool {
        self.remove_token(&token_of(source))
    }

    /// Unregister a token; returns whether it was registered
    pub fn remove_token(&self, token: &str) -> bool {
        let mut index = self.index();
        match index.records.remove(token) {
            Some(record) => {
                self.disk.send(DiskOp::Delete {
                    path: record.artifact,
                });
                debug!("Removed record {}", token);
                true
            }
            None => false,
        }
    }

    /// Unregister everything and delete the store directory
    pub fn clear(&self) {
        let mut index = self.index();
        let count = index.records.len();
        index.records.clear();
        self.disk.send(DiskOp::Purge {
            dir: self.dir.clone(),
        });
        info!("Cleared {} record(s) from {}", count, self.dir.display());
    }

    /// Registered tokens in sorted order
    pub fn tokens(&self) -> Vec<String> {
        self.index().records.keys().cloned().collect()
    }

    /// Snapshot iterator over registered tokens
    pub fn iter(&self) -> std::vec::IntoIter<String> {
        self.tokens().into_iter()
    }

    pub fn len(&self) -> usize {
        self.index().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index().records.is_empty()
    }

    /// Wait until every disk operation queued so far has been applied
    pub async fn flush(&self) {
        self.disk.flush().await;
    }

    /// Background disk operations that failed since the store was created
    pub fn disk_failures(&self) -> u64 {
        self.disk.failures()
    }

    /// Read every artifact envelope under `dir`
    ///
    /// Unreadable files are skipped; a missing directory yields nothing.
    pub async fn scan(dir: &Path) -> CatalinkResult<Vec<ArtifactEnvelope>> {
        let mut envelopes = vec![];
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(envelopes),
            Err(e) => {
                return Err(CatalinkError::io(
                    format!("reading store directory {}", dir.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalinkError::io("reading store entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ARTIFACT_EXT) {
                let content = fs::read_to_string(&path).await.ok();
                if let Some(content) = content {
                    match serde_json::from_str::<ArtifactEnvelope>(&content) {
                        Ok(envelope) => envelopes.push(envelope),
                        Err(e) => debug!("Skipping {}: {}", path.display(), e),
                    }
                }
            }
        }

        envelopes.sort_by(|a, b| a.token.cmp(&b.token));
        Ok(envelopes)
    }

    fn index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn artifact_path(dir: &Path, token: &str) -> PathBuf {
    dir.join(format!("{}.{}", token, ARTIFACT_EXT))
}

impl<'a> IntoIterator for &'a PersistStore {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Blob {
        name: String,
        ttl: Option<Duration>,
    }

    impl Blob {
        fn handle(name: &str) -> SourceHandle {
            Arc::new(Self {
                name: name.to_string(),
                ttl: None,
            })
        }
    }

    impl DataSource for Blob {
        fn name(&self) -> &str {
            &self.name
        }

        fn container(&self) -> &str {
            "python"
        }

        fn description(&self) -> &str {
            ""
        }

        fn set_description(&mut self, _description: String) {}

        fn identity(&self) -> Value {
            json!({"metadata": {"original_name": self.name}})
        }

        fn artifact(&self) -> Value {
            json!({"blob": self.name})
        }

        fn ttl(&self) -> Option<Duration> {
            self.ttl
        }
    }

    async fn test_store() -> (PersistStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = PersistStore::open(temp.path().join("persisted"))
            .await
            .unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn store_lifecycle() {
        let (store, _temp) = test_store().await;
        assert!(store.tokens().is_empty());

        let s = Blob::handle("blah");
        let tok = store.get_tok(s.as_ref());
        store.add(tok.clone(), s.clone());
        assert_eq!(store.tokens(), vec![tok.clone()]);
        store.flush().await;
        assert!(store.dir().exists());

        store.set_ttl(Some(Duration::ZERO));
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![tok.clone()]);
        assert_eq!(store.get_tok(s.as_ref()), tok);
        assert!(!store.needs_refresh(s.as_ref()));

        let artifact = store.artifact(&tok).unwrap();
        assert!(store.remove(s.as_ref()));
        store.flush().await;

        assert!(store.tokens().is_empty());
        assert!(!artifact.exists());
        assert!(store.dir().exists());

        store.clear();
        store.flush().await;

        assert!(!store.dir().exists());
        assert!(store.tokens().is_empty());
        assert_eq!(store.disk_failures(), 0);
    }

    #[tokio::test]
    async fn converges_without_explicit_flush() {
        let (store, _temp) = test_store().await;
        let s = Blob::handle("blah");
        let tok = store.add_source(s);
        let artifact = store.artifact(&tok).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn get_tok_is_stable() {
        let (store, _temp) = test_store().await;
        let s = Blob::handle("blah");
        assert_eq!(store.get_tok(s.as_ref()), store.get_tok(s.as_ref()));
        assert_ne!(
            store.get_tok(s.as_ref()),
            store.get_tok(Blob::handle("other").as_ref())
        );
    }

    #[tokio::test]
    async fn clear_twice_is_fine() {
        let (store, _temp) = test_store().await;
        store.clear();
        store.clear();
        store.flush().await;

        assert!(!store.dir().exists());
        assert_eq!(store.disk_failures(), 0);
    }

    #[tokio::test]
    async fn clear_then_add_recreates_directory() {
        let (store, _temp) = test_store().await;
        store.add_source(Blob::handle("a"));
        store.clear();
        let tok = store.add_source(Blob::handle("b"));
        store.flush().await;

        assert!(store.dir().exists());
        assert!(store.artifact(&tok).unwrap().exists());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn re_add_replaces_and_cleans_up() {
        let (store, _temp) = test_store().await;
        let s = Blob::handle("blah");
        let tok = store.add_source(s.clone());
        let first = store.artifact(&tok).unwrap();
        store.add(tok.clone(), s);
        let second = store.artifact(&tok).unwrap();
        store.flush().await;

        assert_eq!(first, second);
        assert!(second.exists());
        let files: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reopened_store_sees_earlier_artifacts() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("persisted");
        let s = Blob::handle("blah");

        let first = PersistStore::open(&dir).await.unwrap();
        let tok = first.add_source(s.clone());
        first.add_source(s.clone());
        first.flush().await;
        drop(first);

        let second = PersistStore::open(&dir).await.unwrap();
        assert_eq!(second.tokens(), vec![tok.clone()]);
        let loaded = second.get(&tok).unwrap();
        assert_eq!(second.get_tok(loaded.as_ref()), tok);
        assert_eq!(loaded.artifact(), json!({"blob": "blah"}));

        assert!(second.remove(s.as_ref()));
        second.flush().await;
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        second.add_source(s);
        second.flush().await;
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
        assert_eq!(second.disk_failures(), 0);
    }

    #[tokio::test]
    async fn open_on_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = PersistStore::open(temp.path().join("nope")).await.unwrap();
        assert!(store.is_empty());
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn concurrent_adds_leave_one_artifact() {
        let (store, _temp) = test_store().await;
        let store = Arc::new(store);
        let s = Blob::handle("blah");
        let tok = store.get_tok(s.as_ref());

        let mut handles = vec![];
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let s = s.clone();
            let tok = tok.clone();
            handles.push(tokio::spawn(async move { store.add(tok, s) }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        store.flush().await;

        let files: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(store.tokens(), vec![tok]);
    }

    #[tokio::test]
    async fn remove_unregistered_is_noop() {
        let (store, _temp) = test_store().await;
        assert!(!store.remove(Blob::handle("ghost").as_ref()));
        assert!(!store.needs_refresh(Blob::handle("ghost").as_ref()));
    }

    #[tokio::test]
    async fn staleness_follows_ttl() {
        let (store, _temp) = test_store().await;
        let s = Blob::handle("blah");
        store.add_source(s.clone());

        store.set_ttl(None);
        assert!(!store.needs_refresh(s.as_ref()));

        store.set_ttl(Some(Duration::from_millis(1)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.needs_refresh(s.as_ref()));

        store.set_ttl(Some(Duration::from_secs(3600)));
        assert!(!store.needs_refresh(s.as_ref()));
    }

    #[tokio::test]
    async fn record_ttl_overrides_store_ttl() {
        let (store, _temp) = test_store().await;
        let s: SourceHandle = Arc::new(Blob {
            name: "short".to_string(),
            ttl: Some(Duration::from_millis(1)),
        });
        store.add_source(s.clone());
        store.set_ttl(None);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.needs_refresh(s.as_ref()));
    }

    #[tokio::test]
    async fn scan_reads_envelopes() {
        let (store, _temp) = test_store().await;
        let a = store.add_source(Blob::handle("a"));
        let b = store.add_source(Blob::handle("b"));
        store.flush().await;

        let envelopes = PersistStore::scan(store.dir()).await.unwrap();
        let mut expected = vec![a, b];
        expected.sort();
        let tokens: Vec<_> = envelopes.iter().map(|e| e.token.clone()).collect();
        assert_eq!(tokens, expected);
        assert!(envelopes.iter().all(|e| e.container == "python"));
    }

    #[tokio::test]
    async fn scan_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let envelopes = PersistStore::scan(&temp.path().join("nope")).await.unwrap();
        assert!(envelopes.is_empty());
    }

    #[tokio::test]
    async fn iterates_by_reference() {
        let (store, _temp) = test_store().await;
        let tok = store.add_source(Blob::handle("only"));
        let seen: Vec<String> = (&store).into_iter().collect();
        assert_eq!(seen, vec![tok]);
    }
}
