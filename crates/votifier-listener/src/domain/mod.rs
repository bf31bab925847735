//! Domain Layer - protocol logic with no I/O
//!
//! This module contains everything that decides whether a vote is accepted:
//! - Vote events and their timestamps
//! - Per-connection challenges
//! - Token registry with `default` fallback
//! - Protocol sniffing and wire constants
//! - V1 (RSA) and V2 (HMAC) decoders

pub mod challenge;
pub mod errors;
pub mod keys;
pub mod protocol;
pub mod tokens;
pub mod v1;
pub mod v2;
pub mod vote;

pub use challenge::{Challenge, CHALLENGE_BYTES, CHALLENGE_HEX_LEN};
pub use errors::DecodeError;
pub use keys::{KeyMaterial, RSA_KEY_BITS};
pub use protocol::{
    handshake_line, Framing, HEADER_LEN, MAX_BINARY_PAYLOAD_LEN, MAX_JSON_LINE_LEN,
    V1_BLOCK_LEN, V1_HANDSHAKE, V2_BINARY_MAGIC, V2_OK_RESPONSE,
};
pub use tokens::{TokenRegistry, DEFAULT_SERVICE};
pub use v1::V1Decoder;
pub use v2::{sign_payload, V2Decoder, V2Envelope, SIGNATURE_LEN};
pub use vote::{ProtocolVersion, Vote, VoteTimestamp};

#[cfg(test)]
mod tests;
