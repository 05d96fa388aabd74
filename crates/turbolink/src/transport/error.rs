//! Errors raised at the transport boundary.

use std::io;

use thiserror::Error;
use turbolink_config::SocketParseError;

/// Failures reported by a [`Connector`](super::Connector) or
/// [`Transport`](super::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The address could not be parsed as a socket endpoint.
    #[error("invalid link address '{address}': {source}")]
    Address {
        /// Address supplied by the host.
        address: String,
        /// Underlying parse failure.
        #[source]
        source: SocketParseError,
    },
    /// Unix domain sockets are unavailable on this platform.
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnix(String),
    /// Host name resolution failed.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Underlying resolution error.
        #[source]
        source: io::Error,
    },
    /// Dialling the endpoint failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint being dialled.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// A transport worker thread could not be started.
    #[error("failed to start transport worker: {0}")]
    Spawn(#[source] io::Error),
    /// Reading from or writing to the socket failed.
    #[error("socket I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The payload contains a line break and would split its frame.
    #[error("payload contains a line break")]
    EmbeddedNewline,
    /// The transport has shut down and accepts no more frames.
    #[error("transport is closed")]
    Closed,
}
