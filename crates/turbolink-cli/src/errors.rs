//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use turbolink::{LinkError, LinkStatus};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("link operation failed: {0}")]
    Link(#[from] LinkError),
    #[error("could not open a link to {address} (status {status})")]
    ConnectFailed { address: String, status: LinkStatus },
    #[error("no reply to {cmd} within {ticks} ticks")]
    NoReply { cmd: String, ticks: u64 },
    #[error("the peer closed the link before replying to {cmd}")]
    Disconnected { cmd: String },
    #[error("link closed after {received} of {expected} packets")]
    IncompleteListen { expected: usize, received: usize },
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
