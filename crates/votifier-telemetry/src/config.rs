//! Logging configuration from environment variables.

use std::env;

/// Default service name reported when logging starts.
pub const DEFAULT_SERVICE_NAME: &str = "votifier";

/// Default filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration for the logging stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name reported in the "Logging initialized" event
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or full `EnvFilter` syntax)
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VOTIFIER_SERVICE_NAME`: Service name (default: votifier)
    /// - `VOTIFIER_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `VOTIFIER_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `VOTIFIER_JSON_LOGS`: Enable JSON logs (default: true in containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("VOTIFIER_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),

            log_level: lookup("VOTIFIER_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),

            console_output: lookup("VOTIFIER_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("VOTIFIER_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Raise the filter to `debug` when the server runs in debug mode.
    ///
    /// Only the default level is raised; a directive from the environment
    /// wins.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug && self.log_level == DEFAULT_LOG_LEVEL {
            self.log_level = "debug".to_string();
        }
        self
    }
}
