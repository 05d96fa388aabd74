//! Connection lifecycle and the state guarded by the link's mutex.

use std::fmt;
use std::sync::mpsc::Receiver;

use serde::Serialize;
use serde_json::Value;

use crate::flag::EventFlag;
use crate::history::PacketHistory;
use crate::registry::{CommandRegistry, ListenerRegistry};
use crate::transport::{Transport, TransportEvent};

/// Numeric connection status reported to hosts.
///
/// The codes are stable: `0` idle, `1` connecting, `2` open, `3` closed or
/// failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// No connection has been attempted.
    #[default]
    Idle,
    /// A connection attempt is in progress.
    Connecting,
    /// The connection is open.
    Open,
    /// The last connection closed or failed.
    Closed,
}

impl LinkStatus {
    /// Returns the numeric status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Connecting => 1,
            Self::Open => 2,
            Self::Closed => 3,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// A live connection attempt: the transport handle and its event queue.
pub(crate) struct Session {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) events: Receiver<TransportEvent>,
}

pub(crate) enum Connection {
    Idle,
    Connecting(Session),
    Open(Session),
    Closed,
}

impl Connection {
    pub(crate) const fn status(&self) -> LinkStatus {
        match self {
            Self::Idle => LinkStatus::Idle,
            Self::Connecting(_) => LinkStatus::Connecting,
            Self::Open(_) => LinkStatus::Open,
            Self::Closed => LinkStatus::Closed,
        }
    }

    pub(crate) const fn session(&self) -> Option<&Session> {
        match self {
            Self::Connecting(session) | Self::Open(session) => Some(session),
            Self::Idle | Self::Closed => None,
        }
    }
}

/// Everything a link mutates, kept behind one lock.
pub(crate) struct LinkState {
    pub(crate) connection: Connection,
    pub(crate) commands: CommandRegistry,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) history: PacketHistory,
    pub(crate) snapshot: Option<Value>,
    pub(crate) connect_flag: EventFlag,
    pub(crate) packet_flag: EventFlag,
    pub(crate) close_flag: EventFlag,
    /// An open connection has ended since the close notification last fired.
    pub(crate) disconnected: bool,
}

impl LinkState {
    pub(crate) fn new() -> Self {
        Self {
            connection: Connection::Idle,
            commands: CommandRegistry::default(),
            listeners: ListenerRegistry::default(),
            history: PacketHistory::new(),
            snapshot: None,
            connect_flag: EventFlag::new(),
            packet_flag: EventFlag::new(),
            close_flag: EventFlag::new(),
            disconnected: false,
        }
    }

    pub(crate) const fn status(&self) -> LinkStatus {
        self.connection.status()
    }

    pub(crate) const fn is_open(&self) -> bool {
        matches!(self.connection, Connection::Open(_))
    }

    /// Drops packets, latches and the snapshot.
    pub(crate) fn clear_session_data(&mut self) {
        self.history.clear();
        self.commands.clear();
        self.listeners.clear();
        self.snapshot = None;
    }
}
