//! Proxy sources served by a catalog server

use crate::container::registry::{ContainerFactory, ContainerRegistry};
use crate::container::source::DataSource;
use crate::error::{CatalinkError, CatalinkResult};
use crate::remote::{AuthProvider, HttpArgs};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Container kinds served by [`RemoteSource`] out of the box
pub const BUILTIN_CONTAINERS: &[&str] = &["catalog", "dataframe", "ndarray", "python", "xarray"];

/// A source that stays on the server; reads go back through `url`
#[derive(Clone)]
pub struct RemoteSource {
    container: String,
    url: String,
    name: String,
    description: String,
    parameters: Map<String, Value>,
    fields: Map<String, Value>,
    http: HttpArgs,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl RemoteSource {
    pub fn new(
        container: impl Into<String>,
        url: impl Into<String>,
        name: impl Into<String>,
        http: HttpArgs,
        parameters: Map<String, Value>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            container: container.into(),
            url: url.into(),
            name: name.into(),
            description: String::new(),
            parameters,
            fields,
            http,
            auth: None,
        }
    }

    /// Build from the field map of a proxied resolution
    ///
    /// `name` is required; `parameters` and `description` are optional.
    /// Everything else stays in [`RemoteSource::fields`].
    pub fn from_fields(
        container: &str,
        url: &str,
        http: &HttpArgs,
        mut fields: Map<String, Value>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> CatalinkResult<Self> {
        let name = match fields.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(CatalinkError::construct(container, "missing entry name")),
        };
        let parameters = match fields.remove("parameters") {
            Some(Value::Object(parameters)) => parameters,
            None | Some(Value::Null) => Map::new(),
            Some(_) => {
                return Err(CatalinkError::construct(
                    container,
                    "parameters must be a map",
                ))
            }
        };
        let description = match fields.remove("description") {
            Some(Value::String(description)) => description,
            _ => String::new(),
        };

        Ok(Self {
            container: container.to_string(),
            url: url.to_string(),
            name,
            description,
            parameters,
            fields,
            http: http.clone(),
            auth,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Server-supplied fields (shape, dtype, partitions, ...)
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn http(&self) -> &HttpArgs {
        &self.http
    }

    pub fn auth(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.auth.as_ref()
    }

    /// Server-side handle for this open source
    pub fn source_id(&self) -> Option<&str> {
        self.fields.get("source_id").and_then(Value::as_str)
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.fields.get("metadata").and_then(Value::as_object)
    }
}

impl fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSource")
            .field("container", &self.container)
            .field("url", &self.url)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl DataSource for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: String) {
        self.description = description;
    }

    fn identity(&self) -> Value {
        json!({
            "container": self.container,
            "url": self.url,
            "name": self.name,
            "parameters": self.parameters,
        })
    }

    fn artifact(&self) -> Value {
        // Headers may hold credentials and are never persisted
        json!({
            "container": self.container,
            "url": self.url,
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
            "fields": self.fields,
        })
    }

    /// `metadata.ttl` in seconds, when the server sets one
    fn ttl(&self) -> Option<Duration> {
        let secs = self.metadata()?.get("ttl")?.as_f64()?;
        if secs > 0.0 {
            Duration::try_from_secs_f64(secs).ok()
        } else {
            None
        }
    }
}

/// Constructs a [`RemoteSource`] for one container kind
#[derive(Debug, Clone)]
pub struct RemoteSourceFactory {
    kind: String,
}

impl RemoteSourceFactory {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl ContainerFactory for RemoteSourceFactory {
    fn construct(
        &self,
        url: &str,
        http: &HttpArgs,
        fields: Map<String, Value>,
        auth: Option<Arc<dyn AuthProvider>>,
    ) -> CatalinkResult<Box<dyn DataSource>> {
        Ok(Box::new(RemoteSource::from_fields(
            &self.kind, url, http, fields, auth,
        )?))
    }
}

/// Registry with a [`RemoteSourceFactory`] for every builtin kind
pub fn builtin_containers() -> ContainerRegistry {
    let mut registry = ContainerRegistry::new();
    for kind in BUILTIN_CONTAINERS {
        registry.insert(*kind, Arc::new(RemoteSourceFactory::new(*kind)));
    }
    registry
}
