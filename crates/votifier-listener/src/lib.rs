//! # Votifier Vote Listener
//!
//! Accepts vote notifications from server-list websites over TCP and hands
//! each authenticated vote to a [`VoteSink`].
//!
//! Two wire protocols share one port:
//!
//! - **V1:** a single 256-byte block, RSA PKCS#1 v1.5 encrypted under the
//!   server's public key. No response.
//! - **V2:** a JSON envelope signed with HMAC-SHA256 under a per-service
//!   token and bound to a per-connection challenge. Answered with
//!   `{"status":"ok"}` on success.
//!
//! The protocol is sniffed from the first two bytes the peer sends after
//! the handshake.
//!
//! ## Architecture
//!
//! - **Domain Layer:** Framing, challenges, tokens, V1/V2 decoders (no I/O)
//! - **Ports Layer:** The `VoteSink` boundary
//! - **Service Layer:** Connection state machine and TCP accept loop
//! - **Adapters Layer:** RSA key files and concrete sinks
//!
//! ## Example
//!
//! ```rust,no_run
//! use votifier_listener::{load_or_generate_keys, ServerContext, TokenRegistry, VoteListener};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = load_or_generate_keys("rsa")?;
//! let tokens = TokenRegistry::new().with_token("default", "secret123");
//!
//! let mut listener = VoteListener::new(ServerContext::new(tokens, keys));
//! let addr = listener.start("0.0.0.0", 8192).await?;
//! println!("listening on {addr}");
//!
//! listener.stop().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
mod testing;

// =============================================================================
// RE-EXPORTS
// =============================================================================

// Domain
pub use domain::{
    handshake_line, sign_payload, Challenge, DecodeError, Framing, KeyMaterial, ProtocolVersion,
    TokenRegistry, V1Decoder, V2Decoder, V2Envelope, Vote, VoteTimestamp, DEFAULT_SERVICE,
    RSA_KEY_BITS, V2_OK_RESPONSE,
};

// Ports
pub use ports::VoteSink;

// Service
pub use service::{
    ConnectionError, ConnectionHandler, ListenerError, ServerContext, VoteListener,
    CONNECTION_DEADLINE,
};

// Adapters
pub use adapters::{
    generate_and_save_keys, load_or_generate_keys, load_private_key, public_key_pem,
    public_key_single_line, ChannelVoteSink, InMemoryVoteSink, KeyError, LoggingVoteSink,
};
