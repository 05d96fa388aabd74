//! Boundary between the link and the byte stream that carries its packets.
//!
//! A [`Connector`] starts a connection attempt and hands back a [`Transport`]
//! handle straight away. Everything that happens afterwards (the dial
//! completing, inbound messages, failures, the peer hanging up) is reported as
//! a [`TransportEvent`] through the [`EventSink`] supplied to the connector.
//! The link drains those events on its next operation, so implementations may
//! emit from any thread.

mod error;
mod frame;
mod socket;

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

pub use error::TransportError;
pub use socket::SocketConnector;

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Lifecycle notifications produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established and frames may flow.
    Open,
    /// The connection failed; a [`TransportEvent::Close`] usually follows.
    Error(String),
    /// One inbound text frame.
    Message(String),
    /// The connection has ended.
    Close,
}

/// Readiness of a transport handle, mirroring the four socket ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Dial in progress.
    Connecting,
    /// Frames may be sent and received.
    Open,
    /// Shutdown requested but not complete.
    Closing,
    /// No further frames will flow.
    Closed,
}

impl ReadyState {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Sending half of a connection attempt's event queue.
///
/// Emitting never blocks.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<TransportEvent>,
}

impl EventSink {
    /// Queues `event` for the link. Events for a discarded attempt are dropped.
    pub fn emit(&self, event: TransportEvent) {
        if self.sender.send(event).is_err() {
            trace!(target: TRANSPORT_TARGET, "link no longer listening; event dropped");
        }
    }

    /// Reports that the connection is established.
    pub fn opened(&self) {
        self.emit(TransportEvent::Open);
    }

    /// Reports one inbound frame.
    pub fn message(&self, text: impl Into<String>) {
        self.emit(TransportEvent::Message(text.into()));
    }

    /// Reports a failure.
    pub fn error(&self, detail: impl Into<String>) {
        self.emit(TransportEvent::Error(detail.into()));
    }

    /// Reports that the connection has ended.
    pub fn closed(&self) {
        self.emit(TransportEvent::Close);
    }
}

/// Creates the event queue for one connection attempt.
///
/// The link creates one per [`Connector::open`] call; transports and their
/// tests may create their own to observe events directly.
#[must_use]
pub fn channel() -> (EventSink, Receiver<TransportEvent>) {
    let (sender, receiver) = mpsc::channel();
    (EventSink { sender }, receiver)
}

/// Handle to an open or opening connection.
pub trait Transport: Send {
    /// Queues one outbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the frame cannot be queued.
    fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Requests shutdown with a close code and reason. Does not wait.
    fn close(&mut self, code: u16, reason: &str);

    /// Reports the current readiness of the connection.
    fn ready_state(&self) -> ReadyState;
}

/// Starts connection attempts.
pub trait Connector: Send + Sync {
    /// Begins connecting to `address`, reporting progress through `events`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the attempt cannot even begin, for
    /// example because the address is malformed.
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>, TransportError>;
}
