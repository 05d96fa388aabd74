use crate::logging::LogFormat;
use crate::policy::CloseEventPolicy;

/// Address dialled when no other address is configured.
pub const DEFAULT_ADDRESS: &str = "tcp://127.0.0.1:3000";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Interval between host ticks, roughly thirty frames per second.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 33;

/// Time allowed for the socket transport to finish dialling.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Close code reported when the host closes the link.
pub const DEFAULT_CLOSE_CODE: u16 = 1000;

/// Close reason reported when the host closes the link.
pub const DEFAULT_CLOSE_REASON: &str = "script closure";

/// Owned default address used where allocation is required (e.g. serde).
#[must_use]
pub fn default_address() -> String {
    DEFAULT_ADDRESS.to_owned()
}

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default firing policy for the close notification.
#[must_use]
pub const fn default_close_event() -> CloseEventPolicy {
    CloseEventPolicy::WhenNotOpen
}

/// Owned default close reason.
#[must_use]
pub fn default_close_reason() -> String {
    DEFAULT_CLOSE_REASON.to_owned()
}
