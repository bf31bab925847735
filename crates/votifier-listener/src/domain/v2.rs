//! V2 decoder: double-nested JSON envelope, HMAC-SHA256 signature, challenge.
//!
//! ```text
//! outer: {"payload": "<inner JSON as a string>", "signature": "<base64>"}
//! inner: {"serviceName", "username", "address", "timestamp", "challenge"}
//! ```
//!
//! The signature covers the exact `payload` string as received. The inner
//! object is never re-serialized before verification.
//!
//! Checks run in a fixed order: envelope, inner object, token lookup,
//! signature, then challenge. The challenge is only looked at once the
//! sender has proven it holds the shared secret.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use super::challenge::Challenge;
use super::errors::DecodeError;
use super::tokens::TokenRegistry;
use super::vote::{ProtocolVersion, Vote, VoteTimestamp};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 output length.
pub const SIGNATURE_LEN: usize = 32;

/// Outer V2 envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Envelope {
    /// Inner vote object, JSON-encoded as a string.
    #[serde(default)]
    pub payload: String,
    /// Base64 HMAC-SHA256 of `payload` under the service token.
    #[serde(default)]
    pub signature: String,
}

impl V2Envelope {
    /// Sign `payload` with `secret` the way a voting service does.
    ///
    /// `None` if the secret cannot key an HMAC.
    pub fn sign(payload: impl Into<String>, secret: &str) -> Option<Self> {
        let payload = payload.into();
        let signature = sign_payload(secret, &payload)?;
        Some(Self { payload, signature })
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "payload": self.payload,
            "signature": self.signature,
        })
        .to_string()
    }
}

/// Inner V2 vote object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Inner {
    #[serde(default)]
    service_name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default)]
    challenge: String,
}

/// Base64 HMAC-SHA256 of `payload` keyed with `secret`.
pub fn sign_payload(secret: &str, payload: &str) -> Option<String> {
    compute_mac(secret, payload).map(|tag| BASE64_STANDARD.encode(tag))
}

fn compute_mac(secret: &str, payload: &str) -> Option<[u8; SIGNATURE_LEN]> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());

    let mut tag = [0u8; SIGNATURE_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Some(tag)
}

/// Constant-time tag comparison. A wrong-length tag costs the same as a
/// wrong-content tag.
fn signature_matches(expected: &[u8; SIGNATURE_LEN], received: &[u8]) -> bool {
    let mut padded = [0u8; SIGNATURE_LEN];
    let n = received.len().min(SIGNATURE_LEN);
    padded[..n].copy_from_slice(&received[..n]);

    let same_len = Choice::from(u8::from(received.len() == SIGNATURE_LEN));
    bool::from(expected[..].ct_eq(&padded[..]) & same_len)
}

fn timestamp_from_json(value: Option<serde_json::Value>) -> VoteTimestamp {
    match value {
        None | Some(serde_json::Value::Null) => VoteTimestamp::default(),
        Some(serde_json::Value::Number(n)) => VoteTimestamp::Number(n),
        Some(serde_json::Value::String(s)) => VoteTimestamp::Text(s),
        Some(other) => VoteTimestamp::Text(other.to_string()),
    }
}

/// Parses and authenticates V2 envelopes.
#[derive(Debug, Clone, Copy)]
pub struct V2Decoder<'a> {
    tokens: &'a TokenRegistry,
}

impl<'a> V2Decoder<'a> {
    /// Create a decoder over the server's token registry.
    pub fn new(tokens: &'a TokenRegistry) -> Self {
        Self { tokens }
    }

    /// Verify `frame` against the challenge issued on this connection.
    pub fn decode(&self, frame: &[u8], challenge: &Challenge) -> Result<Vote, DecodeError> {
        let outer: V2Envelope = serde_json::from_slice(frame)
            .map_err(|e| DecodeError::InvalidOuterEnvelope(e.to_string()))?;

        let inner: V2Inner = serde_json::from_str(&outer.payload)
            .map_err(|e| DecodeError::InvalidInnerEnvelope(e.to_string()))?;

        let secret = self
            .tokens
            .resolve(&inner.service_name)
            .ok_or_else(|| DecodeError::UnknownService(inner.service_name.clone()))?;

        let received = BASE64_STANDARD
            .decode(outer.signature.as_bytes())
            .map_err(|_| DecodeError::InvalidSignatureEncoding)?;

        // No key, no tag: nothing can match.
        let expected =
            compute_mac(secret, &outer.payload).ok_or(DecodeError::SignatureMismatch)?;
        if !signature_matches(&expected, &received) {
            return Err(DecodeError::SignatureMismatch);
        }

        if !challenge.matches(&inner.challenge) {
            return Err(DecodeError::ChallengeMismatch {
                expected: challenge.value().to_string(),
                received: inner.challenge,
            });
        }

        Ok(Vote {
            service_name: inner.service_name,
            username: inner.username,
            address: inner.address,
            timestamp: timestamp_from_json(inner.timestamp),
            source_protocol_version: ProtocolVersion::V2,
        })
    }
}
