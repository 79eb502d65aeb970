//! Per-entry request authentication
//!
//! Token derivation is left to the host; an `AuthProvider` only hands
//! back the headers to attach to each catalog request.

use std::collections::BTreeMap;
use std::fmt;

/// Supplies extra headers for requests made on behalf of an entry
pub trait AuthProvider: fmt::Debug + Send + Sync {
    /// Headers to merge into the request
    fn headers(&self) -> BTreeMap<String, String>;
}

/// Adds nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Fixed set of headers, usually read from configuration
#[derive(Clone, Default)]
pub struct HeaderAuth {
    headers: BTreeMap<String, String>,
}

impl HeaderAuth {
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self { headers }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: impl AsRef<str>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", token.as_ref()),
        );
        Self { headers }
    }
}

// Header values are credentials; keep them out of debug output.
impl fmt::Debug for HeaderAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderAuth")
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AuthProvider for HeaderAuth {
    fn headers(&self) -> BTreeMap<String, String> {
        self.headers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header() {
        let auth = HeaderAuth::bearer("s3cret");
        assert_eq!(auth.headers()["Authorization"], "Bearer s3cret");
    }

    #[test]
    fn debug_hides_values() {
        let auth = HeaderAuth::bearer("s3cret");
        let shown = format!("{:?}", auth);
        assert!(shown.contains("Authorization"));
        assert!(!shown.contains("s3cret"));
    }

    #[test]
    fn no_auth_is_empty() {
        assert!(NoAuth.headers().is_empty());
    }
}
