//! # Votifier Telemetry
//!
//! Structured logging for the Votifier listener, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use votifier_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env().with_debug(false);
//! init_logging(&config).expect("Failed to init logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VOTIFIER_SERVICE_NAME` | `votifier` | Service name reported at logging startup |
//! | `VOTIFIER_LOG_LEVEL` | `info` | Filter directive (falls back to `RUST_LOG`) |
//! | `VOTIFIER_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `VOTIFIER_JSON_LOGS` | `false` | JSON lines (default `true` in containers) |

mod config;
mod tracing_setup;

pub use config::{TelemetryConfig, DEFAULT_LOG_LEVEL, DEFAULT_SERVICE_NAME};
pub use tracing_setup::{build_filter, init_logging};

use thiserror::Error;

/// Logging initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),

    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },
}
