//! Source construction
//!
//! Turns a [`ResolutionResponse`](crate::remote::ResolutionResponse) into a
//! live source object using factory tables supplied by the host process.

pub mod dispatch;
pub mod registry;
pub mod remote;
pub mod source;

pub use dispatch::dispatch;
pub use registry::{ContainerFactory, ContainerRegistry, PluginFactory, PluginRegistry, Registry};
pub use remote::{builtin_containers, RemoteSource, RemoteSourceFactory, BUILTIN_CONTAINERS};
pub use source::{DataSource, SourceHandle};
