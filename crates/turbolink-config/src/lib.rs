//! Shared configuration for turbolink links and the `turbolink` binary.
//!
//! Values are layered by `ortho_config`: command-line flags win over
//! `TURBOLINK_*` environment variables, which win over the configuration file,
//! which wins over the built-in `DEFAULT_*` values. The engine
//! only consumes the subset it needs (close code and reason, close-event
//! policy, connect timeout); the remaining fields drive the binary's tick loop
//! and telemetry.

mod defaults;
mod logging;
mod policy;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ADDRESS, DEFAULT_CLOSE_CODE, DEFAULT_CLOSE_REASON, DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, DEFAULT_TICK_INTERVAL_MS, default_address, default_close_event,
    default_close_reason, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{CloseEventPolicy, CloseEventPolicyParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Layered configuration for a link and its host loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TURBOLINK")]
pub struct Config {
    /// Address dialled when the host opens the link.
    #[ortho_config(default = defaults::default_address())]
    pub address: String,
    /// Tracing filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Tracing output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Firing policy for the close notification.
    #[ortho_config(default = defaults::default_close_event())]
    pub close_event: CloseEventPolicy,
    /// Milliseconds between host ticks.
    #[ortho_config(default = defaults::DEFAULT_TICK_INTERVAL_MS)]
    pub tick_interval_ms: u64,
    /// Milliseconds the socket transport may spend dialling.
    #[ortho_config(default = defaults::DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,
    /// Close code sent when the host closes the link.
    #[ortho_config(default = defaults::DEFAULT_CLOSE_CODE)]
    pub close_code: u16,
    /// Close reason sent when the host closes the link.
    #[ortho_config(default = defaults::default_close_reason())]
    pub close_reason: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            close_event: default_close_event(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            close_code: DEFAULT_CLOSE_CODE,
            close_reason: default_close_reason(),
        }
    }
}

impl Config {
    /// Address dialled when the host opens the link.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Tracing output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Firing policy for the close notification.
    #[must_use]
    pub const fn close_event(&self) -> CloseEventPolicy {
        self.close_event
    }

    /// Interval between host ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Time allowed for the transport to finish dialling.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Close code sent when the host closes the link.
    #[must_use]
    pub const fn close_code(&self) -> u16 {
        self.close_code
    }

    /// Close reason sent when the host closes the link.
    #[must_use]
    pub fn close_reason(&self) -> &str {
        &self.close_reason
    }
}
