//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use rand::rngs::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use uuid::Uuid;

use crate::domain::{Challenge, KeyMaterial, V2Envelope, RSA_KEY_BITS};

/// One 2048-bit key pair per test binary; generation is slow.
pub fn keys() -> &'static KeyMaterial {
    static KEYS: OnceLock<KeyMaterial> = OnceLock::new();
    KEYS.get_or_init(|| {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).unwrap();
        KeyMaterial::new(private_key)
    })
}

/// Encrypt a V1 plaintext under the test public key.
pub fn v1_block(plaintext: &str) -> Vec<u8> {
    keys()
        .public_key()
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
        .unwrap()
}

/// Challenge with a known value.
pub fn challenge(value: &str) -> Challenge {
    Challenge::from_parts(value, Uuid::new_v4())
}

/// Inner V2 payload text.
pub fn inner_payload(service: &str, challenge: &str) -> String {
    serde_json::json!({
        "serviceName": service,
        "username": "Bob",
        "address": "1.2.3.4",
        "timestamp": 12345,
        "challenge": challenge,
    })
    .to_string()
}

/// Signed outer envelope as wire JSON.
pub fn signed_envelope(service: &str, challenge: &str, secret: &str) -> String {
    V2Envelope::sign(inner_payload(service, challenge), secret)
        .unwrap()
        .to_json()
}
