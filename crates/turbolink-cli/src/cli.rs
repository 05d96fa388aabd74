//! Command-line interface definitions for the `turbolink` binary.
//!
//! Configuration flags (`--address`, `--log-filter`, ...) are consumed by the
//! configuration loader before clap sees the arguments, so only subcommands
//! are declared here.

use clap::{Parser, Subcommand};

/// Ticks allowed for a connection or a reply when `--max-ticks` is omitted.
pub(crate) const DEFAULT_MAX_TICKS: u64 = 300;

/// Drives a polled turbolink connection from the command line.
#[derive(Parser, Debug)]
#[command(name = "turbolink", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations offered by the binary.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Connects and reports the link status once it settles.
    Status {
        /// Ticks to wait for the connection to settle.
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },
    /// Sends one payload and optionally waits for its reply.
    Send {
        /// JSON text to send.
        #[arg(value_name = "PAYLOAD")]
        payload: String,
        /// Waits for a reply whose `cmd` field equals this tag.
        #[arg(long, value_name = "CMD")]
        await_cmd: Option<String>,
        /// Correlates the reply by its `listener` field as well.
        #[arg(long, value_name = "ID", requires = "await_cmd")]
        listener: Option<String>,
        /// Prints only the value at this slash path of the reply.
        #[arg(long, value_name = "PATH", requires = "await_cmd")]
        extract: Option<String>,
        /// Ticks to wait for the connection and then for the reply.
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },
    /// Prints inbound packets until the peer hangs up.
    Listen {
        /// Stops after this many packets.
        #[arg(long)]
        count: Option<usize>,
        /// Stops after this many ticks.
        #[arg(long)]
        max_ticks: Option<u64>,
    },
    /// Reads a value out of a JSON document without connecting.
    Extract {
        /// Slash-separated path such as `payload/users/0`.
        #[arg(value_name = "PATH")]
        path: String,
        /// JSON document to read.
        #[arg(value_name = "JSON")]
        json: String,
    },
}
