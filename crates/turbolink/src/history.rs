//! Ordered, 1-indexed log of every inbound packet.

use serde_json::{Map, Value};

/// Append-only packet log; entry `n` carries sequence number `n`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacketHistory {
    packets: Vec<Value>,
}

impl PacketHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            packets: Vec::new(),
        }
    }

    /// Sequence number the next appended packet will receive.
    #[must_use]
    pub fn next_sequence(&self) -> usize {
        self.packets.len() + 1
    }

    /// Appends a packet and returns its sequence number.
    pub fn push(&mut self, packet: Value) -> usize {
        self.packets.push(packet);
        self.packets.len()
    }

    /// Returns packet `sequence` (1-based).
    #[must_use]
    pub fn get(&self, sequence: usize) -> Option<&Value> {
        sequence
            .checked_sub(1)
            .and_then(|index| self.packets.get(index))
    }

    /// Number of recorded packets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Returns whether no packets are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Drops every recorded packet.
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Packets in arrival order.
    #[must_use]
    pub fn packets(&self) -> &[Value] {
        &self.packets
    }

    /// Renders the history as a JSON object keyed by sequence number.
    #[must_use]
    pub fn to_json(&self) -> String {
        let entries: Map<String, Value> = self
            .packets
            .iter()
            .enumerate()
            .map(|(index, packet)| ((index + 1).to_string(), packet.clone()))
            .collect();
        Value::Object(entries).to_string()
    }
}
