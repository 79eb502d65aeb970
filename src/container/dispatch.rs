//! Resolution result to live source

use crate::container::registry::{ContainerRegistry, PluginRegistry};
use crate::container::source::DataSource;
use crate::error::{CatalinkError, CatalinkResult};
use crate::remote::{HttpArgs, ResolutionResponse};
use tracing::debug;

/// Construct the source described by `response`
///
/// Direct results go to `plugins`; proxied results go to `containers`
/// together with the server `url` and the `http` settings the proxy
/// should reuse. Neither registry is modified.
pub fn dispatch(
    response: ResolutionResponse,
    url: &str,
    http: &HttpArgs,
    plugins: &PluginRegistry,
    containers: &ContainerRegistry,
) -> CatalinkResult<Box<dyn DataSource>> {
    match response {
        ResolutionResponse::Direct { plugin, args } => {
            let factory = plugins
                .get(&plugin)
                .ok_or_else(|| CatalinkError::UnknownPlugin(plugin.clone()))?;
            debug!("Constructing {} source locally", plugin);
            factory.construct(args)
        }
        ResolutionResponse::Proxy {
            container,
            fields,
            auth,
        } => {
            let factory = containers
                .get(&container)
                .ok_or_else(|| CatalinkError::UnknownContainer(container.clone()))?;
            debug!("Constructing {} proxy for {}", container, url);
            factory.construct(url, http, fields, auth)
        }
    }
}
