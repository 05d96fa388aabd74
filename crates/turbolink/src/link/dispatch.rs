//! Applies transport events to the link state.
//!
//! Events are drained in arrival order at the start of every link operation.
//! Inbound messages are only routed while the connection is open; they update
//! the snapshot, offer themselves to any waiting latches and are then appended
//! to the history.

use std::mem;
use std::sync::mpsc::TryRecvError;

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::LINK_TARGET;
use super::state::{Connection, LinkState};
use crate::registry::tag_text;
use crate::transport::{ReadyState, TransportEvent};

impl LinkState {
    /// Applies every queued event of the current connection attempt.
    pub(crate) fn pump(&mut self) {
        loop {
            let Some(session) = self.connection.session() else {
                return;
            };
            match session.events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    debug!(target: LINK_TARGET, "transport event source went away");
                    self.handle_event(TransportEvent::Close);
                    return;
                }
            }
        }
    }

    pub(crate) fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.promote(),
            TransportEvent::Message(text) => {
                if self.is_open() {
                    self.dispatch(&text);
                } else {
                    debug!(target: LINK_TARGET, "message before open ignored");
                }
            }
            TransportEvent::Error(detail) => {
                if self.connection.session().is_some() {
                    warn!(target: LINK_TARGET, %detail, "transport error; closing link");
                    self.teardown();
                }
            }
            TransportEvent::Close => {
                if self.connection.session().is_some() {
                    info!(target: LINK_TARGET, "transport closed");
                    self.teardown();
                }
            }
        }
    }

    /// Detects a transport that stopped without telling us.
    pub(crate) fn resync(&mut self) {
        let stalled = match &self.connection {
            Connection::Open(session) => matches!(
                session.transport.ready_state(),
                ReadyState::Closing | ReadyState::Closed
            ),
            Connection::Idle | Connection::Connecting(_) | Connection::Closed => false,
        };
        if stalled {
            info!(target: LINK_TARGET, "transport no longer open; closing link");
            self.teardown();
        }
    }

    /// Releases the connection and forgets everything learnt through it.
    pub(crate) fn teardown(&mut self) {
        if self.is_open() {
            self.disconnected = true;
        }
        self.connection = Connection::Closed;
        self.clear_session_data();
        self.connect_flag.rearm();
        self.packet_flag.rearm();
        self.close_flag.rearm();
    }

    fn promote(&mut self) {
        match mem::replace(&mut self.connection, Connection::Closed) {
            Connection::Connecting(session) => {
                self.connection = Connection::Open(session);
                self.clear_session_data();
                info!(target: LINK_TARGET, "link open");
            }
            other => {
                debug!(target: LINK_TARGET, "duplicate open event ignored");
                self.connection = other;
            }
        }
    }

    fn dispatch(&mut self, text: &str) {
        let payload: Value = match serde_json::from_str(text) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(target: LINK_TARGET, %error, "inbound packet is not JSON; kept as text");
                self.snapshot = Some(Value::String(text.to_owned()));
                return;
            }
        };

        self.packet_flag.rearm();
        let sequence = self.history.next_sequence();

        if let Some(cmd) = payload.get("cmd").map(tag_text) {
            if self.commands.deliver(&cmd, &payload, sequence) {
                trace!(target: LINK_TARGET, %cmd, sequence, "command latch set");
            }
            if let Some(id) = payload.get("listener").map(tag_text) {
                if self.listeners.deliver(&cmd, &id, &payload, sequence) {
                    trace!(
                        target: LINK_TARGET,
                        %cmd,
                        listener = %id,
                        sequence,
                        "listener latch set"
                    );
                }
            }
        }

        debug!(target: LINK_TARGET, sequence, "packet received");
        self.history.push(payload.clone());
        self.snapshot = Some(payload);
    }
}
