//! # Votifier Node
//!
//! Process-level pieces of the `votifier` binary:
//!
//! - `config/` - `config.toml` load, defaults and persistence
//! - `console/` - stdin command parsing
//! - `runtime/` - listener lifecycle (start, reload, stop, status)

pub mod config;
pub mod console;
pub mod runtime;

pub use config::{ConfigError, NodePaths, VotifierConfig};
pub use console::{ConsoleCommand, HELP_TEXT};
pub use runtime::{format_uptime, StatusReport, VotifierRuntime};
