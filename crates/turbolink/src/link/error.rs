//! Reasons a link operation was refused or failed.

use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use super::{LINK_TARGET, LinkStatus};
use crate::transport::TransportError;

/// Link operations that only make sense on an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LinkOperation {
    /// [`Link::close`](crate::Link::close).
    Close,
    /// [`Link::send`](crate::Link::send).
    Send,
    /// [`Link::send_and_register`](crate::Link::send_and_register).
    SendAndRegister,
    /// [`Link::wait_for`](crate::Link::wait_for).
    WaitFor,
    /// [`Link::register_listener`](crate::Link::register_listener).
    RegisterListener,
    /// [`Link::reset_listener`](crate::Link::reset_listener).
    ResetListener,
    /// [`Link::wait_for_listener`](crate::Link::wait_for_listener).
    WaitForListener,
}

/// Errors produced by the fallible `try_*` link operations.
///
/// The polling surface never returns these: it logs them and falls back to a
/// neutral result.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The operation requires an open connection.
    #[error("cannot {operation}: link is not open")]
    NotOpen {
        /// Operation that was refused.
        operation: LinkOperation,
    },
    /// A connection attempt is already connecting or open.
    #[error("link is already active (status {status})")]
    AlreadyActive {
        /// Status at the time of the request.
        status: LinkStatus,
    },
    /// The transport rejected the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl LinkError {
    /// Records a refused or failed operation at the level it deserves.
    pub(crate) fn log(&self) {
        match self {
            Self::NotOpen { operation } => {
                debug!(target: LINK_TARGET, %operation, "operation ignored; link is not open");
            }
            Self::AlreadyActive { status } => {
                debug!(target: LINK_TARGET, %status, "open ignored; link already active");
            }
            Self::Transport(error) => {
                warn!(target: LINK_TARGET, %error, "transport request failed");
            }
        }
    }
}
