//! Polled connection and dispatch engine for a single socket link.
//!
//! Hosts that can only poll (a cooperative scheduler stepping once per tick)
//! drive a [`Link`] by calling its non-blocking methods. Inbound packets are
//! routed by their `cmd` tag, and optionally a `listener` correlation id, into
//! single-slot [`Latch`]es that the host polls. One-shot notifications for
//! connect, packet and close are edge-triggered through [`EventFlag`]s.
//!
//! The byte stream is abstracted behind [`Connector`] and [`Transport`];
//! [`SocketConnector`] speaks newline-delimited JSON over TCP or Unix sockets.
//! [`extract`] and the JSON helpers are pure functions hosts use on the text
//! they receive.

mod flag;
mod history;
mod json;
mod latch;
mod link;
mod path;
mod registry;
pub mod transport;

pub use flag::EventFlag;
pub use history::PacketHistory;
pub use json::{NOT_JSON, is_valid_json, json_contains_value, make_json};
pub use latch::{Latch, UNSET_SEQUENCE};
pub use link::{Link, LinkError, LinkOperation, LinkOptions, LinkStatus};
pub use path::extract;
pub use registry::tag_text;
pub use transport::{
    Connector, EventSink, ReadyState, SocketConnector, Transport, TransportError, TransportEvent,
};

#[cfg(test)]
mod tests;
