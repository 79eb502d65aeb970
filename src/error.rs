//! Error types for catalink
//!
//! All modules use `CatalinkResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catalink operations
pub type CatalinkResult<T> = Result<T, CatalinkError>;

/// All errors that can occur in catalink
#[derive(Error, Debug)]
pub enum CatalinkError {
    // Resolver errors
    #[error("Server error: {status}, {reason}")]
    Transport { status: u16, reason: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Invalid catalog URL: {0:?}")]
    InvalidUrl(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Dispatch errors
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Unknown container: {0}")]
    UnknownContainer(String),

    #[error("Factory already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Failed to construct {kind} source: {reason}")]
    SourceConstruct { kind: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalinkError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an HTTP transport error for a request URL
    pub fn http(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Http {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Create a source construction error
    pub fn construct(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceConstruct {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by a server-side failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Http { .. } => Some("Check that the catalog server is running and reachable"),
            Self::InvalidUrl(_) => Some("Pass --url or set [catalog] url in the config file"),
            Self::Transport { status: 401 | 403, .. } => {
                Some("Add an authorization header under [catalog.headers]")
            }
            Self::UnknownContainer(_) => Some("The server returned a container kind this client does not support"),
            _ => None,
        }
    }
}

impl From<rmp_serde::encode::Error> for CatalinkError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for CatalinkError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
