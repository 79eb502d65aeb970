//! Factory tables for plugins and containers
//!
//! Registries are plain values: the host builds them once at startup
//! and passes them by reference to whatever needs to construct sources.

use crate::container::source::DataSource;
use crate::error::{CatalinkError, CatalinkResult};
use crate::remote::{AuthProvider, HttpArgs};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Builds a local source from server-supplied constructor args
pub trait PluginFactory: Send + Sync {
    fn construct(&self, args: Map<String, Value>) -> CatalinkResult<Box<dyn DataSource>>;
}

impl<F> PluginFactory for F
where
    F: Fn(Map<String, Value>) -> CatalinkResult<Box<dyn DataSource>> + Send + Sync,
{
    fn construct(&self, args: Map<String, Value>) -> CatalinkResult<Box<dyn DataSource>> {
        self(args)
    }
}

/// Builds a proxy bound to the catalog server at `url`
pub trait ContainerFactory: Send + Sync {
    fn construct(
        &self,
        url: &str,
        http: &HttpArgs,
        fields: Map<String, Value>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> CatalinkResult<Box<dyn DataSource>>;
}

/// Name-indexed factory table
pub struct Registry<F: ?Sized> {
    factories: HashMap<String, Arc<F>>,
}

/// Plugins this process can instantiate directly
pub type PluginRegistry = Registry<dyn PluginFactory>;

/// Proxy constructors by container kind
pub type ContainerRegistry = Registry<dyn ContainerFactory>;

impl<F: ?Sized> Registry<F> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`; names are unique
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<F>) -> CatalinkResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(CatalinkError::AlreadyRegistered(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Register or replace, returning the previous factory
    pub fn insert(&mut self, name: impl Into<String>, factory: Arc<F>) -> Option<Arc<F>> {
        self.factories.insert(name.into(), factory)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<F>> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> BTreeSet<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<F: ?Sized> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Registry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
