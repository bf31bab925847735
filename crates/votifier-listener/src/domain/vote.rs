//! Decoded vote events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol generation a vote arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Legacy RSA-encrypted 256-byte block.
    V1,
    /// HMAC-signed JSON envelope (binary or raw-line framing).
    V2,
}

impl ProtocolVersion {
    /// Numeric generation (1 or 2).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.as_u8())
    }
}

/// Timestamp as sent by the voting service.
///
/// Services disagree on the type: some send epoch millis as a JSON number,
/// others a string. The value is kept as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoteTimestamp {
    /// Numeric timestamp (usually epoch millis).
    Number(serde_json::Number),
    /// Textual timestamp.
    Text(String),
}

impl Default for VoteTimestamp {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for VoteTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for VoteTimestamp {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for VoteTimestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A decoded, authenticated vote notification.
///
/// Only the decoders construct votes; they are handed to a
/// [`VoteSink`](crate::ports::VoteSink) once and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Name of the service (voting site) that sent the vote.
    pub service_name: String,
    /// Username the vote was cast for.
    pub username: String,
    /// Address reported by the service. Opaque, never validated.
    pub address: String,
    /// Timestamp reported by the service, or receive time for V1 votes
    /// that carry none.
    pub timestamp: VoteTimestamp,
    /// Protocol generation the vote was decoded from.
    pub source_protocol_version: ProtocolVersion,
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} voted on {} (address: {}, timestamp: {})",
            self.source_protocol_version,
            self.username,
            self.service_name,
            self.address,
            self.timestamp
        )
    }
}
