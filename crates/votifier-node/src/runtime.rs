//! # Node Runtime
//!
//! Owns the running listener. `init_system` is both first start and
//! `reload`: it stops whatever is running, re-reads the config file and the
//! key directory, and starts a fresh listener over a fresh snapshot.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};
use votifier_listener::{
    load_or_generate_keys, public_key_single_line, KeyMaterial, ServerContext, VoteListener,
};

use crate::config::{NodePaths, VotifierConfig};

const RULE: &str = "----------------------------------------------------------------";

/// Running listener plus the keys it was started with.
pub struct VotifierRuntime {
    paths: NodePaths,
    started_at: Instant,
    listener: Option<VoteListener>,
    keys: Option<KeyMaterial>,
}

/// Snapshot printed by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub bound: Option<SocketAddr>,
    pub v2_enabled: bool,
    pub token_count: usize,
    pub key_bits: Option<usize>,
    pub uptime: Duration,
}

impl VotifierRuntime {
    /// Create a runtime; nothing is loaded until `init_system`.
    pub fn new(paths: NodePaths) -> Self {
        Self {
            paths,
            started_at: Instant::now(),
            listener: None,
            keys: None,
        }
    }

    /// Stop any running listener, load config and keys, start listening.
    pub async fn init_system(&mut self) -> Result<SocketAddr> {
        self.stop().await;

        let config = VotifierConfig::load_or_create(&self.paths.config)
            .with_context(|| format!("Error loading config {}", self.paths.config.display()))?
            .with_env_overrides(|key| std::env::var(key).ok());

        let keys = load_or_generate_keys(&self.paths.key_dir).with_context(|| {
            format!("Error loading RSA keys from {}", self.paths.key_dir.display())
        })?;

        let tokens = config.token_registry();
        let ctx = ServerContext::new(tokens, keys.clone()).with_debug(config.debug);

        let mut listener = VoteListener::new(ctx);
        let addr = listener
            .start(&config.host, config.port)
            .await
            .context("Failed to start listener")?;

        info!("RSA keys loaded ({} bits)", keys.bits());
        match public_key_single_line(&keys) {
            Ok(line) => {
                info!("{RULE}");
                info!("PUBLIC KEY (use this for your server list):");
                info!("{line}");
                info!("{RULE}");
            }
            Err(e) => warn!(error = %e, "Could not export public key"),
        }

        if config.token_support {
            let services: Vec<&str> = config.tokens.keys().map(String::as_str).collect();
            info!(services = ?services, "V2 token support: ENABLED");
        } else {
            info!("V2 token support: DISABLED (set token_support = true in the config to use V2)");
        }

        self.listener = Some(listener);
        self.keys = Some(keys);

        Ok(addr)
    }

    /// Re-run `init_system`.
    pub async fn reload(&mut self) -> Result<SocketAddr> {
        info!("Reloading configuration...");
        let addr = self.init_system().await?;
        info!("Reload complete");
        Ok(addr)
    }

    /// Stop the listener if one is running.
    pub async fn stop(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop().await;
        }
    }

    /// Time since the process started.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// One-line public key of the loaded key pair.
    pub fn public_key_line(&self) -> Option<String> {
        self.keys
            .as_ref()
            .and_then(|keys| public_key_single_line(keys).ok())
    }

    /// Current listener state.
    pub fn status(&self) -> StatusReport {
        let listener = self.listener.as_ref();
        StatusReport {
            bound: listener.and_then(VoteListener::local_addr),
            v2_enabled: listener.is_some_and(|l| l.context().v2_enabled()),
            token_count: listener.map_or(0, |l| l.context().tokens().len()),
            key_bits: self.keys.as_ref().map(KeyMaterial::bits),
            uptime: self.uptime(),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            Some(addr) => writeln!(f, "Listening: {addr}")?,
            None => writeln!(f, "Listening: stopped")?,
        }
        writeln!(
            f,
            "V2 support: {}",
            if self.v2_enabled { "enabled" } else { "disabled" }
        )?;
        writeln!(f, "Tokens: {}", self.token_count)?;
        match self.key_bits {
            Some(bits) => writeln!(f, "RSA key: {bits} bits")?,
            None => writeln!(f, "RSA key: not loaded")?,
        }
        write!(f, "Uptime: {}", format_uptime(self.uptime))
    }
}

/// Whole seconds as `1h2m3s`, dropping leading zero units.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}
