//! Catalog entries that live on a remote server
//!
//! An entry knows where its server is, which user parameters it accepts
//! and how to authenticate. Opening it resolves the entry remotely and
//! constructs the resulting source locally.

use crate::container::{dispatch, ContainerRegistry, DataSource, PluginRegistry};
use crate::error::CatalinkResult;
use crate::remote::resolver::{self, http_base};
use crate::remote::{AuthProvider, CatalogOptions, HttpArgs, NoAuth, ResolutionRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Parameter a user may supply when opening an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserParameter {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Declared type name, as listed by the server
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Value used when the caller does not supply one
    #[serde(default)]
    pub default: Value,
}

/// Registries and global settings shared by every open
#[derive(Debug, Clone, Copy)]
pub struct OpenContext<'a> {
    pub plugins: &'a PluginRegistry,
    pub containers: &'a ContainerRegistry,

    /// Lowest-precedence HTTP settings (the `[http]` config section)
    pub defaults: &'a HttpArgs,
}

/// Summary of an entry as shown in listings
#[derive(Debug, Clone, Serialize)]
pub struct EntryDescription {
    pub name: String,
    pub container: Option<String>,
    pub description: String,
    pub direct_access: bool,
    pub user_parameters: Vec<UserParameter>,
    pub metadata: Map<String, Value>,
}

/// An entry referring to a data definition held by a catalog server
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    url: String,
    name: String,
    container: Option<String>,
    description: String,
    metadata: Map<String, Value>,
    user_parameters: Vec<UserParameter>,
    http: HttpArgs,
    auth: Arc<dyn AuthProvider>,
    page_size: Option<u64>,
    direct_access: bool,
    getenv: bool,
    getshell: bool,
}

impl RemoteEntry {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            container: None,
            description: String::new(),
            metadata: Map::new(),
            user_parameters: Vec::new(),
            http: HttpArgs::new(),
            auth: Arc::new(NoAuth),
            page_size: None,
            direct_access: false,
            getenv: true,
            getshell: true,
        }
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_parameters(mut self, parameters: Vec<UserParameter>) -> Self {
        self.user_parameters = parameters;
        self
    }

    /// Entry-level HTTP settings, layered over the global defaults
    pub fn with_http(mut self, http: HttpArgs) -> Self {
        self.http = http;
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u64>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_direct_access(mut self, direct_access: bool) -> Self {
        self.direct_access = direct_access;
        self
    }

    pub fn with_expansion(mut self, getenv: bool, getshell: bool) -> Self {
        self.getenv = getenv;
        self.getshell = getshell;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn describe(&self) -> EntryDescription {
        EntryDescription {
            name: self.name.clone(),
            container: self.container.clone(),
            description: self.description.clone(),
            direct_access: self.direct_access,
            user_parameters: self.user_parameters.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Supplied parameters plus defaults for any the caller left out
    ///
    /// Defaults are passed through as declared; the server applies its
    /// own type coercion.
    pub fn fill_defaults(&self, mut supplied: Map<String, Value>) -> Map<String, Value> {
        for parameter in &self.user_parameters {
            if !supplied.contains_key(&parameter.name) {
                supplied.insert(parameter.name.clone(), parameter.default.clone());
            }
        }
        supplied
    }

    /// Effective HTTP settings: global < entry (with auth) < call
    pub fn http_args(&self, defaults: &HttpArgs, call: &HttpArgs) -> HttpArgs {
        let entry = self.http.clone().with_headers(self.auth.headers());
        defaults.merged(&entry).merged(call)
    }

    /// Open with the entry's own settings
    pub fn open(
        &self,
        parameters: Map<String, Value>,
        ctx: OpenContext<'_>,
    ) -> CatalinkResult<Box<dyn DataSource>> {
        self.open_with(parameters, &HttpArgs::new(), ctx)
    }

    /// Open with call-level HTTP overrides
    ///
    /// Blocks on one network round trip.
    pub fn open_with(
        &self,
        parameters: Map<String, Value>,
        call: &HttpArgs,
        ctx: OpenContext<'_>,
    ) -> CatalinkResult<Box<dyn DataSource>> {
        let url = http_base(&self.url)?;
        let http = self.http_args(ctx.defaults, call);

        let mut request = ResolutionRequest::new(&self.name, self.fill_defaults(parameters))
            .with_plugins(ctx.plugins.names());
        if let Some(container) = &self.container {
            request = request.with_container(container.clone());
        }

        let catalog = CatalogOptions {
            auth: Some(Arc::clone(&self.auth)),
            getenv: self.getenv,
            getshell: self.getshell,
            page_size: self.page_size,
        };

        let response = resolver::resolve(&url, &request, &http, &catalog)?;
        let direct = response.is_direct();
        let mut source = dispatch(response, &url, &http, ctx.plugins, ctx.containers)?;
        if direct {
            source.set_description(self.description.clone());
        }

        debug!("Opened entry {} as {}", self.name, source.container());
        Ok(source)
    }
}
