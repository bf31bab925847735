//! RSA key provisioning.
//!
//! Keys live in a directory as two PEM files:
//!
//! - `private.key` - PKCS#1 (`BEGIN RSA PRIVATE KEY`); PKCS#8 is also read
//! - `public.key` - SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`)
//!
//! A missing private key means first start: a 2048-bit pair is generated
//! and both files are written.

use std::fs;
use std::path::{Path, PathBuf};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::RsaPrivateKey;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{KeyMaterial, RSA_KEY_BITS, V1_BLOCK_LEN};

/// Private key file name inside the key directory.
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Public key file name inside the key directory.
pub const PUBLIC_KEY_FILE: &str = "public.key";

/// Key provisioning failures.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Reading or writing a key file failed.
    #[error("key file {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A key file could not be parsed or encoded.
    #[error("invalid key encoding: {0}")]
    Pem(String),

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    Generate(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> KeyError + '_ {
    move |source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load the key pair from `dir`, generating and persisting one if absent.
pub fn load_or_generate_keys(dir: impl AsRef<Path>) -> Result<KeyMaterial, KeyError> {
    let dir = dir.as_ref();
    let private_path = dir.join(PRIVATE_KEY_FILE);

    if private_path.exists() {
        let keys = load_private_key(&private_path)?;
        if keys.modulus_len() != V1_BLOCK_LEN {
            warn!(
                bits = keys.bits(),
                "RSA key is not 2048-bit; V1 blocks are fixed at 256 bytes and will not decrypt"
            );
        }
        return Ok(keys);
    }

    generate_and_save_keys(dir)
}

/// Parse a PEM private key file.
pub fn load_private_key(path: &Path) -> Result<KeyMaterial, KeyError> {
    let pem = fs::read_to_string(path).map_err(io_error(path))?;

    let private_key = RsaPrivateKey::from_pkcs1_pem(&pem)
        .or_else(|pkcs1_err| {
            RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|_| KeyError::Pem(pkcs1_err.to_string()))
        })?;

    Ok(KeyMaterial::new(private_key))
}

/// Generate a fresh pair and write both PEM files into `dir`.
pub fn generate_and_save_keys(dir: &Path) -> Result<KeyMaterial, KeyError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    info!(bits = RSA_KEY_BITS, dir = %dir.display(), "Generating RSA key pair");
    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| KeyError::Generate(e.to_string()))?;
    let keys = KeyMaterial::new(private_key);

    let private_pem = keys
        .private_key()
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyError::Pem(e.to_string()))?;
    let private_path = dir.join(PRIVATE_KEY_FILE);
    fs::write(&private_path, private_pem.as_bytes()).map_err(io_error(&private_path))?;

    let public_path = dir.join(PUBLIC_KEY_FILE);
    fs::write(&public_path, public_key_pem(&keys)?).map_err(io_error(&public_path))?;

    Ok(keys)
}

/// Public key as an SPKI PEM document.
pub fn public_key_pem(keys: &KeyMaterial) -> Result<String, KeyError> {
    keys.public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Pem(e.to_string()))
}

/// Public key as one base64 line, without PEM armor, for server lists.
pub fn public_key_single_line(keys: &KeyMaterial) -> Result<String, KeyError> {
    let der = keys
        .public_key()
        .to_public_key_der()
        .map_err(|e| KeyError::Pem(e.to_string()))?;
    Ok(BASE64_STANDARD.encode(der.as_bytes()))
}
