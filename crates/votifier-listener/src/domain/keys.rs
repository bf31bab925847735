//! RSA key material for V1 decryption.

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Modulus size of generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// The server's RSA key pair. Read-only once constructed.
#[derive(Clone)]
pub struct KeyMaterial {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyMaterial {
    /// Wrap a private key, deriving its public half.
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    /// Private half, used to decrypt V1 blocks.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Public half, handed out to voting services.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Modulus length in bytes (the V1 block size for this key).
    pub fn modulus_len(&self) -> usize {
        self.public_key.size()
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> usize {
        self.modulus_len() * 8
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}
