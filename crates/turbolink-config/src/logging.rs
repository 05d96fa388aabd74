//! Output formats for the `turbolink` binary's log stream.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of each log record written to stderr.
///
/// Parsed case-insensitively from `--log-format`, `TURBOLINK_LOG_FORMAT` or
/// the `log_format` key of the configuration file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One terse line per record, for people watching a terminal.
    #[default]
    Compact,
    /// One flattened JSON object per record, for log collectors.
    Json,
}

/// Returned when text names no known [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
