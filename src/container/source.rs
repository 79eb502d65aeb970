//! Live data source contract

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a materialized source
pub type SourceHandle = Arc<dyn DataSource>;

/// A source object produced by a plugin or container factory
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Entry name the source was opened from
    fn name(&self) -> &str;

    /// Plugin name or container kind that built this source
    fn container(&self) -> &str;

    fn description(&self) -> &str;

    fn set_description(&mut self, description: String);

    /// Parameters that define this source
    ///
    /// Two sources with equal identities are the same source; the persist
    /// store derives its token from this value, so it must not contain
    /// anything that varies between opens (timestamps, session ids).
    fn identity(&self) -> Value;

    /// Durable representation written by the persist store
    fn artifact(&self) -> Value;

    /// How long a persisted copy stays fresh; `None` defers to the store
    fn ttl(&self) -> Option<Duration> {
        None
    }
}
