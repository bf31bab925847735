//! Connection and listener errors.

use std::time::Duration;

use thiserror::Error;

use crate::domain::DecodeError;

/// Why a connection ended without an accepted vote.
///
/// Always fatal to that one connection, never to the listener.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket read or write failed (includes short reads).
    #[error("{stage} failed: {source}")]
    Transport {
        /// Step of the exchange that failed.
        stage: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The connection deadline passed before the exchange finished.
    #[error("connection deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// A V2 frame arrived but no tokens are configured.
    #[error("received V2 vote but no tokens are configured")]
    TokensUnavailable,

    /// A raw-JSON line ran past the size ceiling without a newline.
    #[error("JSON line exceeds {0} bytes")]
    FrameTooLarge(usize),

    /// The vote failed decoding or verification.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ConnectionError {
    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport_error",
            Self::Timeout(_) => "timeout",
            Self::TokensUnavailable => "tokens_unavailable",
            Self::FrameTooLarge(_) => "frame_too_large",
            Self::Decode(e) => e.kind(),
        }
    }
}

/// Listener lifecycle failures. Reported to the operator at startup.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a listener that is already accepting.
    #[error("listener is already running on {0}")]
    AlreadyRunning(std::net::SocketAddr),
}
