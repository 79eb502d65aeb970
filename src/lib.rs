//! catalink - remote data catalog client
//!
//! Resolves entries on a remote catalog server into local or proxied
//! sources, and caches materialized sources in a TTL-governed persist
//! store keyed by a deterministic token.

pub mod cli;
pub mod config;
pub mod container;
pub mod entry;
pub mod error;
pub mod persist;
pub mod remote;

pub use error::{CatalinkError, CatalinkResult};
