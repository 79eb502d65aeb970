//! Request and response types of the open-source handshake

use crate::error::{CatalinkError, CatalinkResult};
use crate::remote::auth::AuthProvider;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Container kind that marks a nested catalog
pub const CATALOG_CONTAINER: &str = "catalog";

/// Response key that selects the direct-access branch
const PLUGIN_KEY: &str = "plugin";
const ARGS_KEY: &str = "args";
const CONTAINER_KEY: &str = "container";

/// One resolution call: which entry, with which user parameters, and
/// which plugins this process could instantiate itself
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    pub entry_name: String,
    pub parameters: Map<String, Value>,
    pub available_plugins: BTreeSet<String>,

    /// Container kind the entry declared in its listing, used when the
    /// server response leaves it out
    pub container: Option<String>,
}

impl ResolutionRequest {
    pub fn new(entry_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            entry_name: entry_name.into(),
            parameters,
            available_plugins: BTreeSet::new(),
            container: None,
        }
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Wire payload for this request
    pub(crate) fn payload(&self) -> OpenPayload<'_> {
        OpenPayload {
            action: "open",
            name: &self.entry_name,
            parameters: &self.parameters,
            available_plugins: self.available_plugins.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenPayload<'a> {
    pub action: &'static str,
    pub name: &'a str,
    pub parameters: &'a Map<String, Value>,
    pub available_plugins: Vec<&'a str>,
}

/// Settings forwarded to nested catalogs only
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Auth the nested catalog should reuse for its own requests
    pub auth: Option<Arc<dyn AuthProvider>>,

    /// Allow environment-variable expansion in parameter defaults
    pub getenv: bool,

    /// Allow shell-command expansion in parameter defaults
    pub getshell: bool,

    /// Entries fetched per listing page (unset = server default)
    pub page_size: Option<u64>,
}

/// Outcome of a resolution
#[derive(Debug, Clone)]
pub enum ResolutionResponse {
    /// The server delegated to a plugin the client can run locally
    Direct {
        plugin: String,
        args: Map<String, Value>,
    },

    /// The server keeps serving the source; build a proxy for it
    Proxy {
        container: String,
        fields: Map<String, Value>,
        auth: Option<Arc<dyn AuthProvider>>,
    },
}

impl ResolutionResponse {
    /// Interpret a decoded server response for `request`
    pub fn from_server(
        mut response: Map<String, Value>,
        request: &ResolutionRequest,
        catalog: &CatalogOptions,
    ) -> CatalinkResult<Self> {
        if let Some(plugin) = response.remove(PLUGIN_KEY) {
            let plugin = match plugin {
                Value::String(name) => name,
                other => {
                    return Err(CatalinkError::Serialization(format!(
                        "plugin name must be a string, got {}",
                        other
                    )))
                }
            };
            let args = match response.remove(ARGS_KEY) {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(args)) => args,
                Some(other) => {
                    return Err(CatalinkError::Serialization(format!(
                        "plugin args must be a map, got {}",
                        other
                    )))
                }
            };
            return Ok(Self::Direct { plugin, args });
        }

        let container = match response.remove(CONTAINER_KEY) {
            Some(Value::String(kind)) => kind,
            Some(Value::Null) | None => request.container.clone().ok_or_else(|| {
                CatalinkError::Serialization(
                    "response names neither a plugin nor a container".to_string(),
                )
            })?,
            Some(other) => {
                return Err(CatalinkError::Serialization(format!(
                    "container must be a string, got {}",
                    other
                )))
            }
        };

        let mut fields = response;
        fields.insert("name".to_string(), Value::String(request.entry_name.clone()));
        fields.insert(
            "parameters".to_string(),
            Value::Object(request.parameters.clone()),
        );

        let auth = if container == CATALOG_CONTAINER {
            fields.insert("getenv".to_string(), Value::Bool(catalog.getenv));
            fields.insert("getshell".to_string(), Value::Bool(catalog.getshell));
            fields.insert(
                "page_size".to_string(),
                catalog.page_size.map(Value::from).unwrap_or(Value::Null),
            );
            catalog.auth.clone()
        } else {
            None
        };

        Ok(Self::Proxy {
            container,
            fields,
            auth,
        })
    }

    /// Plugin name or container kind, for logging
    pub fn kind(&self) -> &str {
        match self {
            Self::Direct { plugin, .. } => plugin,
            Self::Proxy { container, .. } => container,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }
}
