//! Remote catalog protocol
//!
//! Resolves a named entry on a catalog server into either a direct
//! plugin invocation or a proxied container, in a single MessagePack
//! round trip against `POST {url}/v1/source`.

pub mod auth;
pub mod codec;
pub mod http;
pub mod protocol;
pub mod resolver;

pub use auth::{AuthProvider, HeaderAuth, NoAuth};
pub use http::HttpArgs;
pub use protocol::{CatalogOptions, ResolutionRequest, ResolutionResponse, CATALOG_CONTAINER};
pub use resolver::resolve;
