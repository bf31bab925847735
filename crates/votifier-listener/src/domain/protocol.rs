//! Wire constants and protocol sniffing.
//!
//! ```text
//! server → client   "VOTIFIER 1\n"                      (no tokens)
//!                   "VOTIFIER 2 <32 hex challenge>\n"   (tokens configured)
//!
//! client → server   V1:        256-byte RSA block
//!                   V2 binary: 's' ':' len(u16 BE) json[len]
//!                   V2 line:   '{' ... '\n'
//!
//! server → client   V2 only:   {"status":"ok"}\r\n
//! ```

use super::challenge::Challenge;
use super::tokens::TokenRegistry;

/// Bytes read before the framing is decided.
pub const HEADER_LEN: usize = 2;

/// V1 block size: the modulus length of a 2048-bit RSA key.
pub const V1_BLOCK_LEN: usize = 256;

/// Magic prefix of the V2 binary framing (`s:`).
pub const V2_BINARY_MAGIC: [u8; 2] = [0x73, 0x3A];

/// Largest payload the binary framing can carry.
pub const MAX_BINARY_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Ceiling for a raw-JSON line including its CRLF terminator.
pub const MAX_JSON_LINE_LEN: usize = MAX_BINARY_PAYLOAD_LEN + 2;

/// Acknowledgment written after a V2 vote verifies.
pub const V2_OK_RESPONSE: &[u8] = b"{\"status\":\"ok\"}\r\n";

/// Handshake offered when no tokens are configured.
pub const V1_HANDSHAKE: &str = "VOTIFIER 1\n";

/// Framing chosen from the first two bytes of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Fixed 256-byte RSA block; the header is its first two bytes.
    V1Block,
    /// `s:` magic, then a big-endian u16 length and the JSON payload.
    V2Binary,
    /// A JSON line; the header is the start of the JSON text.
    V2Json,
}

impl Framing {
    /// Classify a connection from its first two bytes. Needs no further reads.
    pub fn detect(header: [u8; HEADER_LEN]) -> Self {
        if header == V2_BINARY_MAGIC {
            Self::V2Binary
        } else if header[0] == b'{' {
            Self::V2Json
        } else {
            Self::V1Block
        }
    }

    /// Whether this framing carries a V2 envelope.
    pub fn is_v2(self) -> bool {
        matches!(self, Self::V2Binary | Self::V2Json)
    }
}

/// Handshake line for a connection.
///
/// V2 is offered whenever the registry holds any token, `default` or not.
pub fn handshake_line(tokens: &TokenRegistry, challenge: &Challenge) -> String {
    if tokens.is_empty() {
        V1_HANDSHAKE.to_string()
    } else {
        format!("VOTIFIER 2 {}\n", challenge.value())
    }
}
