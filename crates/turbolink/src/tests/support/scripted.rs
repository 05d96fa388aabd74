//! Connector whose transport events are injected by the test.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::transport::{
    Connector, EventSink, ReadyState, Transport, TransportError, TransportEvent,
};

/// Records every request made by a link and lets tests play the peer.
///
/// Clones share state, so a test keeps one handle while the link owns another.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    sink: Option<EventSink>,
    ready: Option<ReadyState>,
    refusal: Option<String>,
    addresses: Vec<String>,
    sent: Vec<String>,
    closes: Vec<(u16, String)>,
}

impl ScriptedConnector {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("script mutex poisoned")
    }

    fn emit(&self, event: TransportEvent) {
        let script = self.script();
        let sink = script.sink.as_ref().expect("no connection attempt to script");
        sink.emit(event);
    }

    /// Makes the next `open` fail synchronously with `message`.
    pub fn refuse_next(&self, message: &str) {
        self.script().refusal = Some(message.to_owned());
    }

    /// Completes the dial.
    pub fn accept(&self) {
        self.script().ready = Some(ReadyState::Open);
        self.emit(TransportEvent::Open);
    }

    /// Delivers one inbound frame.
    pub fn deliver(&self, text: &str) {
        self.emit(TransportEvent::Message(text.to_owned()));
    }

    /// Reports a transport failure.
    pub fn fail(&self, detail: &str) {
        self.emit(TransportEvent::Error(detail.to_owned()));
    }

    /// Plays the peer closing the connection.
    pub fn hang_up(&self) {
        self.script().ready = Some(ReadyState::Closed);
        self.emit(TransportEvent::Close);
    }

    /// Marks the transport closed without emitting any event.
    pub fn lose_silently(&self) {
        self.script().ready = Some(ReadyState::Closed);
    }

    /// Drops the event sink so the link sees its event source disappear.
    pub fn forget_sink(&self) {
        self.script().sink = None;
    }

    /// Addresses passed to `open`, including refused ones.
    pub fn addresses(&self) -> Vec<String> {
        self.script().addresses.clone()
    }

    /// Frames handed to the transport.
    pub fn sent(&self) -> Vec<String> {
        self.script().sent.clone()
    }

    /// Close requests handed to the transport.
    pub fn closes(&self) -> Vec<(u16, String)> {
        self.script().closes.clone()
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, address: &str, events: EventSink) -> Result<Box<dyn Transport>, TransportError> {
        let mut script = self.script();
        script.addresses.push(address.to_owned());
        if let Some(message) = script.refusal.take() {
            return Err(TransportError::Connect {
                endpoint: address.to_owned(),
                source: io::Error::other(message),
            });
        }
        script.sink = Some(events);
        script.ready = Some(ReadyState::Connecting);
        Ok(Box::new(ScriptedTransport {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("script mutex poisoned")
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if text.contains('\n') {
            return Err(TransportError::EmbeddedNewline);
        }
        self.script().sent.push(text.to_owned());
        Ok(())
    }

    fn close(&mut self, code: u16, reason: &str) {
        let mut script = self.script();
        script.closes.push((code, reason.to_owned()));
        script.ready = Some(ReadyState::Closing);
    }

    fn ready_state(&self) -> ReadyState {
        self.script().ready.unwrap_or(ReadyState::Closed)
    }
}
