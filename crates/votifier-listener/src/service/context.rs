//! Immutable server snapshot shared by every connection task.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::LoggingVoteSink;
use crate::domain::{KeyMaterial, TokenRegistry};
use crate::ports::VoteSink;

/// Total time one connection may take, handshake through response.
pub const CONNECTION_DEADLINE: Duration = Duration::from_secs(10);

/// Tokens, keys and sink captured when a listener is built.
///
/// Handlers only read from it. A reload builds a new context for a new
/// listener; connections still running on the old one keep theirs.
pub struct ServerContext {
    tokens: TokenRegistry,
    keys: KeyMaterial,
    sink: Arc<dyn VoteSink>,
    debug: bool,
    idle_timeout: Duration,
}

impl ServerContext {
    /// Create a context that logs votes and uses the standard deadline.
    pub fn new(tokens: TokenRegistry, keys: KeyMaterial) -> Self {
        Self {
            tokens,
            keys,
            sink: Arc::new(LoggingVoteSink::new()),
            debug: false,
            idle_timeout: CONNECTION_DEADLINE,
        }
    }

    /// Deliver votes to `sink` instead of the log.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn VoteSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Enable payload dumps in debug logs.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the per-connection deadline.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Token registry.
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// RSA key pair.
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Vote sink.
    pub fn sink(&self) -> &dyn VoteSink {
        self.sink.as_ref()
    }

    /// Whether payload dumps are enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Per-connection deadline.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Whether the V2 handshake is offered.
    pub fn v2_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("tokens", &self.tokens)
            .field("keys", &self.keys)
            .field("debug", &self.debug)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}
