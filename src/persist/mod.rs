//! Persist store for materialized sources
//!
//! Sources are cached under a token derived from their identity, so the
//! same definition always maps to the same record.
//!
//! # Record States
//!
//! | State | In index | Artifact on disk | `needs_refresh` |
//! |-------|----------|------------------|-----------------|
//! | Absent | no | no | false |
//! | Fresh | yes | yes (eventually) | false |
//! | Stale | yes | yes (eventually) | true |
//!
//! Stale records are never evicted automatically. Index changes are
//! immediate; disk writes and deletes run on a background task and are
//! observable once [`PersistStore::flush`] returns.
//!
//! Each token owns one artifact, `{dir}/{token}.json`. Opening a store
//! reloads the artifacts already in its directory as [`PersistedSource`]
//! records, so a later run can iterate, refresh or remove them.

pub mod record;
pub mod store;
pub mod token;
mod worker;

pub use record::{ArtifactEnvelope, CacheRecord, PersistedSource};
pub use store::PersistStore;
pub use token::{fingerprint, token_of};
