//! Per-service shared secrets for V2 signatures.

use std::collections::HashMap;

/// Reserved service name used when a service has no token of its own.
pub const DEFAULT_SERVICE: &str = "default";

/// Immutable service name → secret mapping.
///
/// Built once from configuration and shared read-only by every handler.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: HashMap<String, String>,
}

impl TokenRegistry {
    /// Create an empty registry (V1-only server).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a token, builder style.
    #[must_use]
    pub fn with_token(mut self, service: impl Into<String>, secret: impl Into<String>) -> Self {
        self.tokens.insert(service.into(), secret.into());
        self
    }

    /// Whether any token is configured. Decides which handshake is offered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of configured tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Resolve the secret for `service`, falling back to `default`.
    pub fn resolve(&self, service: &str) -> Option<&str> {
        self.tokens
            .get(service)
            .or_else(|| self.tokens.get(DEFAULT_SERVICE))
            .map(String::as_str)
    }

    /// Configured service names, sorted.
    pub fn services(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tokens.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl From<HashMap<String, String>> for TokenRegistry {
    fn from(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl FromIterator<(String, String)> for TokenRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("services", &self.services())
            .finish()
    }
}
