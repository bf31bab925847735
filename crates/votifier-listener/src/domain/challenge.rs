//! Per-connection challenge nonces.
//!
//! A challenge is issued in the V2 handshake line and must come back inside
//! the signed inner payload. A captured envelope therefore only verifies on
//! the connection it was produced for.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use uuid::Uuid;

/// Random bytes per challenge (hex-encoded to 32 characters).
pub const CHALLENGE_BYTES: usize = 16;

/// Hex length of an encoded challenge.
pub const CHALLENGE_HEX_LEN: usize = CHALLENGE_BYTES * 2;

/// A fresh nonce bound to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    value: String,
    connection_id: Uuid,
}

impl Challenge {
    /// Generate a challenge from the OS CSPRNG for a new connection.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CHALLENGE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            value: hex::encode(bytes),
            connection_id: Uuid::new_v4(),
        }
    }

    /// Build a challenge with a fixed value.
    pub fn from_parts(value: impl Into<String>, connection_id: Uuid) -> Self {
        Self {
            value: value.into(),
            connection_id,
        }
    }

    /// The 32 lowercase hex characters sent in the handshake.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Identifier of the connection this challenge was issued to.
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Exact comparison against the challenge echoed by the client.
    pub fn matches(&self, received: &str) -> bool {
        self.value == received
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
