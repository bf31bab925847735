//! # Votifier Node
//!
//! Standalone vote listener.
//!
//! ## Startup Sequence
//!
//! 1. Resolve config and key paths (`VOTIFIER_CONFIG`, `VOTIFIER_KEY_DIR`)
//! 2. Initialize logging (the config `debug` flag raises the level)
//! 3. Load or create config, load or generate RSA keys
//! 4. Start the listener
//! 5. Serve console commands until `stop` or Ctrl+C
//!
//! A failed first start ends the process with an error. A failed `reload`
//! is logged and the console stays up so the operator can fix the config.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use votifier_node::console::spawn_stdin_reader;
use votifier_node::{
    format_uptime, ConsoleCommand, NodePaths, VotifierConfig, VotifierRuntime, HELP_TEXT,
};
use votifier_telemetry::{init_logging, TelemetryConfig};

const BANNER: &[&str] = &[
    "===========================================",
    "  Votifier vote listener",
    "  Protocols: V1 (RSA) / V2 (HMAC tokens)",
    "===========================================",
];

#[tokio::main]
async fn main() -> Result<()> {
    let paths = NodePaths::from_env();

    // Only needed for the log level; a broken file is reported by init_system.
    let debug = VotifierConfig::read_existing(&paths.config)
        .ok()
        .flatten()
        .is_some_and(|c| c.debug);
    let telemetry = TelemetryConfig::from_env().with_debug(debug);
    init_logging(&telemetry).context("Failed to initialize logging")?;

    for line in BANNER {
        info!("{line}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "Initializing Votifier...");

    let mut runtime = VotifierRuntime::new(paths);
    runtime
        .init_system()
        .await
        .context("Votifier failed to start")?;

    let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
    let mut console_open = match spawn_stdin_reader(cmd_tx) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Console unavailable");
            false
        }
    };

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                break;
            }

            command = cmd_rx.recv(), if console_open => {
                let Some(command) = command else {
                    // stdin closed: keep serving until Ctrl+C
                    console_open = false;
                    continue;
                };

                match command {
                    ConsoleCommand::Stop => break,
                    ConsoleCommand::Reload => {
                        if let Err(e) = runtime.reload().await {
                            error!("{e:#}");
                        }
                    }
                    ConsoleCommand::Uptime => {
                        info!("Uptime: {}", format_uptime(runtime.uptime()));
                    }
                    ConsoleCommand::Status => {
                        info!("--- System Status ---");
                        for line in runtime.status().to_string().lines() {
                            info!("{line}");
                        }
                        info!("---------------------");
                    }
                    ConsoleCommand::PubKey => match runtime.public_key_line() {
                        Some(line) => info!("{line}"),
                        None => warn!("No key pair loaded"),
                    },
                    ConsoleCommand::Help => info!("{HELP_TEXT}"),
                    ConsoleCommand::Unknown(cmd) => {
                        info!("Unknown command: '{cmd}'. Type 'help' for list.");
                    }
                }
            }
        }
    }

    info!("Stopping Votifier...");
    runtime.stop().await;
    info!("Shutdown complete");

    Ok(())
}
