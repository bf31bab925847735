//! # Node Configuration
//!
//! `config.toml` with every field optional:
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8192
//! debug = false
//! token_support = false
//!
//! [tokens]
//! default = "3f9a0c1d2b4e5f60"
//! ```
//!
//! A missing file is written out with defaults and a freshly generated
//! `default` token, so the operator has something to copy into a server
//! list. The listener only receives the tokens while `token_support` is on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use votifier_listener::{TokenRegistry, DEFAULT_SERVICE};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Default directory holding `private.key` and `public.key`.
pub const DEFAULT_KEY_DIR: &str = "rsa";

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default Votifier port.
pub const DEFAULT_PORT: u16 = 8192;

/// Random bytes in a generated token (hex-encoded on disk).
pub const TOKEN_BYTES: usize = 8;

const CONFIG_HEADER: &str = "\
# Votifier configuration
# host: 0.0.0.0 to listen on all interfaces
# port: default Votifier port is 8192
# token_support: offer the V2 protocol using the [tokens] table

";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Listener settings from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotifierConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Verbose logging and V2 payload dumps.
    pub debug: bool,
    /// Offer V2 using `tokens`.
    pub token_support: bool,
    /// Service name to shared secret.
    pub tokens: BTreeMap<String, String>,
}

impl Default for VotifierConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            token_support: false,
            tokens: BTreeMap::new(),
        }
    }
}

impl VotifierConfig {
    /// Load `path`, creating it with defaults if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if let Some(config) = Self::read_existing(path)? {
            return Ok(config);
        }

        let mut config = Self::default();
        config
            .tokens
            .insert(DEFAULT_SERVICE.to_string(), generate_token());
        config.persist(path)?;

        info!(path = %path.display(), "Created default configuration");
        Ok(config)
    }

    /// Parse `path` if it exists.
    pub fn read_existing(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Ok(Some(toml::from_str(&contents)?))
    }

    /// Write the config with the comment header.
    pub fn persist(&self, path: &Path) -> Result<(), ConfigError> {
        let body = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| ConfigError::Io {
                path: parent.to_path_buf(),
                error,
            })?;
        }
        fs::write(path, format!("{CONFIG_HEADER}{body}")).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Apply `VOTIFIER_HOST` and `VOTIFIER_PORT`. Invalid values are ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("VOTIFIER_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }

        if let Some(port) = lookup("VOTIFIER_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid VOTIFIER_PORT"),
            }
        }

        self
    }

    /// Tokens handed to the listener. Empty unless `token_support` is on.
    pub fn token_registry(&self) -> TokenRegistry {
        if !self.token_support {
            return TokenRegistry::new();
        }
        self.tokens
            .iter()
            .map(|(service, secret)| (service.clone(), secret.clone()))
            .collect()
    }
}

/// File locations, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePaths {
    /// Config file.
    pub config: PathBuf,
    /// Key directory.
    pub key_dir: PathBuf,
}

impl Default for NodePaths {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            key_dir: PathBuf::from(DEFAULT_KEY_DIR),
        }
    }
}

impl NodePaths {
    /// Read `VOTIFIER_CONFIG` and `VOTIFIER_KEY_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            config: lookup("VOTIFIER_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.config),
            key_dir: lookup("VOTIFIER_KEY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_dir),
        }
    }
}

/// Random token: `TOKEN_BYTES` bytes from the OS, lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
