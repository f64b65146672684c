//! Canonical request identity
//!
//! Turns (path, query parameters) into one deterministic key string so the
//! cache, the in-flight table, and the throttle queue all agree on what
//! "the same logical request" means, independent of call-site parameter
//! ordering.
//!
//! Known limitation, kept on purpose: keys are derived purely from path and
//! query parameters and do not incorporate the acting user or tenant beyond
//! whatever already appears in those parameters. Two different sessions
//! issuing textually identical requests share cache and in-flight state.

use std::fmt;

/// Canonical identity of a logical request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    /// Resolves a path and its query parameters into a canonical key.
    ///
    /// The path is normalized to a single leading `/`; parameters are sorted
    /// lexicographically by name (ties broken by value) and serialized as a
    /// percent-encoded query string. Pure function, no failure modes.
    pub fn resolve(path: &str, params: &[(String, String)]) -> Self {
        let normalized = format!("/{}", path.trim_start_matches('/'));

        if params.is_empty() {
            return Self(normalized);
        }

        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in sorted {
            serializer.append_pair(name, value);
        }

        Self(format!("{}?{}", normalized, serializer.finish()))
    }

    /// Returns the canonical key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
