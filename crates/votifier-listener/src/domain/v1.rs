//! V1 decoder: RSA PKCS#1 v1.5 block with newline-delimited fields.
//!
//! Plaintext layout:
//!
//! ```text
//! VOTE\n<serviceName>\n<username>\n<address>\n<timestamp>\n
//! ```
//!
//! V1 has no challenge, so an identical block is accepted on every
//! connection it is sent on. That is a property of the protocol.

use rand::rngs::OsRng;
use rsa::Pkcs1v15Encrypt;

use super::errors::DecodeError;
use super::keys::KeyMaterial;
use super::vote::{ProtocolVersion, Vote, VoteTimestamp};

/// Opcode expected in the first field.
pub const V1_OPCODE: &str = "VOTE";

/// Minimum number of `\n`-separated fields (opcode + four values).
pub const V1_MIN_FIELDS: usize = 5;

/// Decrypts and parses V1 blocks.
#[derive(Debug, Clone, Copy)]
pub struct V1Decoder<'a> {
    keys: &'a KeyMaterial,
}

impl<'a> V1Decoder<'a> {
    /// Create a decoder bound to the server key pair.
    pub fn new(keys: &'a KeyMaterial) -> Self {
        Self { keys }
    }

    /// Decrypt `block` and parse the vote it carries.
    ///
    /// The private-key operation is blinded with fresh randomness on every
    /// call, so its timing does not depend on the attacker-chosen block.
    ///
    /// `received_at` fills the timestamp when the sender left it empty.
    pub fn decode(&self, block: &[u8], received_at: i64) -> Result<Vote, DecodeError> {
        let plaintext = self
            .keys
            .private_key()
            .decrypt_blinded(&mut OsRng, Pkcs1v15Encrypt, block)
            .map_err(|e| DecodeError::Decryption(e.to_string()))?;

        parse_plaintext(&String::from_utf8_lossy(&plaintext), received_at)
    }
}

/// Parse decrypted V1 plaintext. Content after the timestamp is ignored.
pub fn parse_plaintext(plaintext: &str, received_at: i64) -> Result<Vote, DecodeError> {
    let fields: Vec<&str> = plaintext.split('\n').collect();

    if fields.len() < V1_MIN_FIELDS {
        return Err(DecodeError::MalformedPayload("fewer than 5 fields"));
    }
    if fields[0] != V1_OPCODE {
        return Err(DecodeError::MalformedPayload("missing VOTE opcode"));
    }

    let timestamp = match fields[4].trim() {
        "" => VoteTimestamp::from(received_at),
        ts => VoteTimestamp::from(ts),
    };

    Ok(Vote {
        service_name: fields[1].to_string(),
        username: fields[2].to_string(),
        address: fields[3].to_string(),
        timestamp,
        source_protocol_version: ProtocolVersion::V1,
    })
}
