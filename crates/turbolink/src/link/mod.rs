//! The polled connection: lifecycle, dispatch and the host-facing surface.
//!
//! A [`Link`] owns one connection at a time. Hosts call its methods once per
//! tick; each call first applies every transport event queued since the last
//! call, then does its own work, all under a single lock. Nothing here blocks
//! on I/O and no method panics or returns an error: refusals are logged and the
//! method falls back to `false`, `None`, an empty string or `-1`. The `try_*`
//! variants expose the reason instead.

mod dispatch;
mod error;
mod options;
mod state;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::info;
use turbolink_config::{CloseEventPolicy, Config};

pub use error::{LinkError, LinkOperation};
pub use options::LinkOptions;
pub use state::LinkStatus;

use self::state::{Connection, LinkState, Session};
use crate::latch::{Latch, UNSET_SEQUENCE};
use crate::transport::{self, Connector, SocketConnector};

pub(crate) const LINK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::link");

/// A single polled socket connection with request/response latches.
///
/// # Examples
///
/// ```no_run
/// use turbolink::Link;
///
/// let link = Link::default();
/// link.open("tcp://127.0.0.1:3000");
///
/// // Once per tick:
/// if link.poll_connect_event() {
///     link.send(r#"{"cmd":"status"}"#);
/// }
/// if link.wait_for("status") {
///     println!("{:?}", link.value("status"));
/// }
/// ```
pub struct Link {
    connector: Box<dyn Connector>,
    options: LinkOptions,
    state: Mutex<LinkState>,
}

impl Link {
    /// Creates an idle link that opens connections through `connector`.
    #[must_use]
    pub fn new(connector: impl Connector + 'static, options: LinkOptions) -> Self {
        Self {
            connector: Box::new(connector),
            options,
            state: Mutex::new(LinkState::new()),
        }
    }

    /// Creates an idle socket link configured from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SocketConnector::from_config(config),
            LinkOptions::from_config(config),
        )
    }

    /// Options this link was created with.
    #[must_use]
    pub const fn options(&self) -> &LinkOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `operation` against the state after applying pending events.
    fn with_state<R>(&self, operation: impl FnOnce(&mut LinkState) -> R) -> R {
        let mut state = self.lock();
        state.pump();
        operation(&mut *state)
    }

    fn ignore(result: Result<(), LinkError>) {
        if let Err(error) = result {
            error.log();
        }
    }

    // Lifecycle

    /// Starts connecting to `address` unless a connection is already active.
    pub fn open(&self, address: &str) {
        Self::ignore(self.try_open(address));
    }

    /// Starts connecting to `address`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::AlreadyActive`] while connecting or open, and
    /// [`LinkError::Transport`] when the connector rejects the attempt. A
    /// rejected attempt leaves the link closed.
    pub fn try_open(&self, address: &str) -> Result<(), LinkError> {
        self.with_state(|state| {
            let status = state.status();
            if state.connection.session().is_some() {
                return Err(LinkError::AlreadyActive { status });
            }

            let (sink, events) = transport::channel();
            match self.connector.open(address, sink) {
                Ok(transport) => {
                    info!(target: LINK_TARGET, %address, "link connecting");
                    state.connection = Connection::Connecting(Session { transport, events });
                    Ok(())
                }
                Err(error) => {
                    state.connection = Connection::Closed;
                    Err(LinkError::Transport(error))
                }
            }
        })
    }

    /// Closes an open connection with the configured code and reason.
    pub fn close(&self) {
        Self::ignore(self.try_close());
    }

    /// Closes an open connection.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotOpen`] unless the link is open.
    pub fn try_close(&self) -> Result<(), LinkError> {
        self.with_state(|state| {
            let Connection::Open(session) = &mut state.connection else {
                return Err(LinkError::NotOpen {
                    operation: LinkOperation::Close,
                });
            };
            session
                .transport
                .close(self.options.close_code(), self.options.close_reason());
            info!(
                target: LINK_TARGET,
                code = self.options.close_code(),
                reason = self.options.close_reason(),
                "link closed by host"
            );
            state.teardown();
            Ok(())
        })
    }

    /// Reports whether the link is open, first reconciling with the
    /// transport's own ready state.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.with_state(|state| {
            state.resync();
            state.is_open()
        })
    }

    /// Current numeric status.
    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        self.with_state(|state| state.status())
    }

    /// Last inbound payload. Text that did not parse is kept as a JSON string.
    #[must_use]
    pub fn socket_data(&self) -> Option<Value> {
        self.with_state(|state| state.snapshot.clone())
    }

    // Sending

    /// Sends `payload` if the link is open.
    pub fn send(&self, payload: &str) {
        Self::ignore(self.try_send(payload));
    }

    /// Sends `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotOpen`] unless the link is open and
    /// [`LinkError::Transport`] when the transport refuses the frame.
    pub fn try_send(&self, payload: &str) -> Result<(), LinkError> {
        self.with_state(|state| {
            let Connection::Open(session) = &mut state.connection else {
                return Err(LinkError::NotOpen {
                    operation: LinkOperation::Send,
                });
            };
            session.transport.send(payload)?;
            Ok(())
        })
    }

    /// Arms the listener latch for `(cmd, id)` and sends `payload`.
    pub fn send_and_register(&self, cmd: &str, id: &str, payload: &str) {
        Self::ignore(self.try_send_and_register(cmd, id, payload));
    }

    /// Arms the listener latch for `(cmd, id)`, lowering it if it already
    /// exists, then sends `payload`.
    ///
    /// # Errors
    ///
    /// As [`Link::try_send`]. The latch stays armed when the send fails.
    pub fn try_send_and_register(
        &self,
        cmd: &str,
        id: &str,
        payload: &str,
    ) -> Result<(), LinkError> {
        self.with_state(|state| {
            let Connection::Open(session) = &mut state.connection else {
                return Err(LinkError::NotOpen {
                    operation: LinkOperation::SendAndRegister,
                });
            };
            state.listeners.arm(cmd, id);
            session.transport.send(payload)?;
            Ok(())
        })
    }

    // Command latches

    /// Edge poll for a reply tagged `cmd`.
    ///
    /// The first call registers interest and returns `false`. Later calls
    /// return `true` once per buffered reply, consuming it.
    #[must_use]
    pub fn wait_for(&self, cmd: &str) -> bool {
        self.with_state(|state| {
            if !state.is_open() {
                LinkError::NotOpen {
                    operation: LinkOperation::WaitFor,
                }
                .log();
                return false;
            }
            state.commands.wait_for(cmd)
        })
    }

    /// Last reply accepted for `cmd`, read or not.
    #[must_use]
    pub fn value(&self, cmd: &str) -> Option<Value> {
        self.with_state(|state| state.commands.get(cmd).and_then(Latch::value).cloned())
    }

    /// History position of the last reply accepted for `cmd`, or `-1`.
    #[must_use]
    pub fn sequence(&self, cmd: &str) -> i64 {
        self.with_state(|state| {
            state
                .commands
                .get(cmd)
                .map_or(UNSET_SEQUENCE, Latch::sequence)
        })
    }

    // Listener latches

    /// Ensures a latch exists for `(cmd, id)`.
    pub fn register_listener(&self, cmd: &str, id: &str) {
        self.with_state(|state| {
            if state.is_open() {
                state.listeners.register(cmd, id);
            } else {
                LinkError::NotOpen {
                    operation: LinkOperation::RegisterListener,
                }
                .log();
            }
        });
    }

    /// Lowers the latch for `(cmd, id)`, keeping its value and sequence.
    pub fn reset_listener(&self, cmd: &str, id: &str) {
        self.with_state(|state| {
            if state.is_open() {
                state.listeners.reset(cmd, id);
            } else {
                LinkError::NotOpen {
                    operation: LinkOperation::ResetListener,
                }
                .log();
            }
        });
    }

    /// Level poll for a reply on `(cmd, id)`; never consumes or registers.
    #[must_use]
    pub fn wait_for_listener(&self, cmd: &str, id: &str) -> bool {
        self.with_state(|state| {
            if !state.is_open() {
                LinkError::NotOpen {
                    operation: LinkOperation::WaitForListener,
                }
                .log();
                return false;
            }
            state
                .listeners
                .get(cmd, id)
                .is_some_and(Latch::is_returned)
        })
    }

    /// Last reply accepted for `(cmd, id)`.
    #[must_use]
    pub fn listener_value(&self, cmd: &str, id: &str) -> Option<Value> {
        self.with_state(|state| {
            state
                .listeners
                .get(cmd, id)
                .and_then(Latch::value)
                .cloned()
        })
    }

    /// History position of the last reply accepted for `(cmd, id)`, or `-1`.
    #[must_use]
    pub fn listener_sequence(&self, cmd: &str, id: &str) -> i64 {
        self.with_state(|state| {
            state
                .listeners
                .get(cmd, id)
                .map_or(UNSET_SEQUENCE, Latch::sequence)
        })
    }

    // One-shot notifications

    /// Fires once after the link opens.
    #[must_use]
    pub fn poll_connect_event(&self) -> bool {
        self.with_state(|state| {
            let open = state.is_open();
            state.connect_flag.poll(open)
        })
    }

    /// Fires once per inbound packet while open.
    #[must_use]
    pub fn poll_packet_event(&self) -> bool {
        self.with_state(|state| {
            let open = state.is_open();
            state.packet_flag.poll(open)
        })
    }

    /// Fires once when the link is seen closed, subject to the configured
    /// [`CloseEventPolicy`].
    #[must_use]
    pub fn poll_close_event(&self) -> bool {
        let policy = self.options.close_event();
        self.with_state(|state| {
            let closed = !state.is_open();
            let condition = match policy {
                CloseEventPolicy::WhenNotOpen => closed,
                CloseEventPolicy::OnDisconnect => closed && state.disconnected,
            };
            let fired = state.close_flag.poll(condition);
            if fired {
                state.disconnected = false;
            }
            fired
        })
    }

    // Packet history

    /// Packets received since the link opened or the history was cleared,
    /// oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Value> {
        self.with_state(|state| state.history.packets().to_vec())
    }

    /// History as a JSON object keyed `"1"`, `"2"`, ...
    #[must_use]
    pub fn history_json(&self) -> String {
        self.with_state(|state| state.history.to_json())
    }

    /// Packet with 1-based position `sequence`.
    #[must_use]
    pub fn history_item(&self, sequence: usize) -> Option<Value> {
        self.with_state(|state| state.history.get(sequence).cloned())
    }

    /// Number of packets in the history.
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.with_state(|state| state.history.len())
    }

    /// Empties the history. Latched values are kept.
    pub fn clear_history(&self) {
        self.with_state(|state| state.history.clear());
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new(SocketConnector::default(), LinkOptions::default())
    }
}
