//! Single round-trip resolution against a catalog server

use crate::error::{CatalinkError, CatalinkResult};
use crate::remote::codec;
use crate::remote::http::HttpArgs;
use crate::remote::protocol::{CatalogOptions, ResolutionRequest, ResolutionResponse};
use tracing::debug;

/// Scheme some catalogs advertise for their server address
const ALT_SCHEME: &str = "intake://";

/// Path of the open-source endpoint
const SOURCE_PATH: &str = "/v1/source";

/// Normalize a catalog base URL into an HTTP base
pub fn http_base(base_url: &str) -> CatalinkResult<String> {
    let trimmed = base_url.trim();
    let (stripped, aliased) = match trimmed.strip_prefix(ALT_SCHEME) {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };
    let base = stripped.trim_end_matches('/');
    if base.is_empty() {
        return Err(CatalinkError::InvalidUrl(base_url.to_string()));
    }
    // `intake://host:port` carries no HTTP scheme of its own
    if aliased && !base.contains("://") {
        return Ok(format!("http://{}", base));
    }
    Ok(base.to_string())
}

/// Endpoint URL used by [`resolve`]
pub fn source_endpoint(base_url: &str) -> CatalinkResult<String> {
    Ok(format!("{}{}", http_base(base_url)?, SOURCE_PATH))
}

/// Ask the server at `base_url` how to open `request.entry_name`
///
/// Issues exactly one blocking POST. Non-2xx answers fail with
/// [`CatalinkError::Transport`]; nothing is retried.
pub fn resolve(
    base_url: &str,
    request: &ResolutionRequest,
    http: &HttpArgs,
    catalog: &CatalogOptions,
) -> CatalinkResult<ResolutionResponse> {
    let url = source_endpoint(base_url)?;
    let body = codec::encode(&request.payload())?;

    debug!(
        "Resolving entry {} at {} ({} plugins available)",
        request.entry_name,
        url,
        request.available_plugins.len()
    );

    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(http.timeout())
        .build();
    let agent: ureq::Agent = config.into();

    let mut call = agent.post(url.as_str());
    for (name, value) in &http.headers {
        call = call.header(name.as_str(), value.as_str());
    }

    let mut response = call
        .send(&body[..])
        .map_err(|e| CatalinkError::http(&url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalinkError::Transport {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let bytes = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| CatalinkError::http(&url, e))?;
    let decoded = codec::decode_map(&bytes)?;
    let resolved = ResolutionResponse::from_server(decoded, request, catalog)?;

    debug!(
        "Entry {} resolved to {} {}",
        request.entry_name,
        if resolved.is_direct() { "plugin" } else { "container" },
        resolved.kind()
    );
    Ok(resolved)
}
