//! Monitoring setup for Threadline.
//!
//! Binaries call [`init_logging`] once at startup; library crates only emit
//! `tracing` events and never install a subscriber themselves.

pub mod logging;

pub use logging::{build_filter, init_logging};

/// Configuration for initializing the logging system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter (e.g., "info,threadline_core=debug").
    /// `RUST_LOG` takes precedence when set.
    pub log_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub enable_json_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "threadline".to_string(),
            log_filter: "warn".to_string(),
            enable_json_logging: false,
        }
    }
}

impl MonitoringConfig {
    /// Filter for a CLI verbosity count: 0 = warn, 1 = info, 2 = debug, more = trace
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.log_filter = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_string();
        self
    }
}
