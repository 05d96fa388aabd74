//! Single-slot arrival latch shared by both registries.

use serde_json::Value;

/// Sequence reported for a latch that has never received a packet.
pub const UNSET_SEQUENCE: i64 = -1;

/// Records whether a packet has arrived for a key since the last consumption.
///
/// A latch buffers at most one packet. While it holds an unread packet
/// (`is_returned() == true`) later arrivals for the same key are ignored, so
/// the stored value is always the *first* unread arrival. Consuming or
/// resetting the latch lowers the flag but keeps the value and sequence
/// readable until the next arrival replaces them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Latch {
    returned: bool,
    value: Option<Value>,
    sequence: Option<usize>,
}

impl Latch {
    /// Creates an empty latch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            returned: false,
            value: None,
            sequence: None,
        }
    }

    /// Returns whether an unread packet is buffered.
    #[must_use]
    pub const fn is_returned(&self) -> bool {
        self.returned
    }

    /// Returns the last packet accepted by the latch.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the history position of the last accepted packet, or
    /// [`UNSET_SEQUENCE`] when nothing has been accepted.
    #[must_use]
    pub fn sequence(&self) -> i64 {
        self.sequence.map_or(UNSET_SEQUENCE, |position| {
            i64::try_from(position).unwrap_or(i64::MAX)
        })
    }

    /// Lowers the flag and reports whether it was raised.
    pub const fn consume(&mut self) -> bool {
        let was_returned = self.returned;
        self.returned = false;
        was_returned
    }

    /// Lowers the flag without reporting its previous state.
    pub const fn reset(&mut self) {
        self.returned = false;
    }

    /// Stores `payload` unless an unread packet is already buffered.
    ///
    /// Returns `true` when the packet was accepted.
    pub(crate) fn offer(&mut self, payload: &Value, sequence: usize) -> bool {
        if self.returned {
            return false;
        }
        self.value = Some(payload.clone());
        self.sequence = Some(sequence);
        self.returned = true;
        true
    }
}
