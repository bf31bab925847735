//! Decode and verification failures.
//!
//! None of these ever reach the peer. Each one is logged locally and the
//! connection is closed without a response, so a client cannot tell a bad
//! signature from an unknown service or broken JSON.

use thiserror::Error;

/// Why a V1 block or V2 envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// V1: the block did not decrypt under the server's private key.
    #[error("RSA decryption failed: {0}")]
    Decryption(String),

    /// V1: decrypted plaintext is not `VOTE\n` followed by four fields.
    #[error("malformed V1 payload: {0}")]
    MalformedPayload(&'static str),

    /// V2: the frame is not a JSON `{payload, signature}` object.
    #[error("invalid outer envelope: {0}")]
    InvalidOuterEnvelope(String),

    /// V2: the `payload` string is not a JSON vote object.
    #[error("invalid inner envelope: {0}")]
    InvalidInnerEnvelope(String),

    /// V2: no token for the service and no `default` token.
    #[error("unknown service '{0}' and no default token")]
    UnknownService(String),

    /// V2: `signature` is not valid base64.
    #[error("signature is not valid base64")]
    InvalidSignatureEncoding,

    /// V2: HMAC over the payload does not match.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// V2: signed payload carries a challenge issued to another connection.
    #[error("challenge mismatch: expected {expected}, got {received}")]
    ChallengeMismatch {
        /// Challenge issued on this connection.
        expected: String,
        /// Challenge found in the payload.
        received: String,
    },
}

impl DecodeError {
    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decryption(_) => "decryption_error",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::InvalidOuterEnvelope(_) => "invalid_outer_envelope",
            Self::InvalidInnerEnvelope(_) => "invalid_inner_envelope",
            Self::UnknownService(_) => "unknown_service",
            Self::InvalidSignatureEncoding => "invalid_signature_encoding",
            Self::SignatureMismatch => "signature_mismatch",
            Self::ChallengeMismatch { .. } => "challenge_mismatch",
        }
    }
}
