//! Latch registries keyed by command tag and correlation id.
//!
//! Keys are plain strings. Inbound `cmd` and `listener` fields are normalised
//! with [`tag_text`] before lookup so that a numeric tag such as `7` matches a
//! registration made with `"7"`.

use std::collections::HashMap;

use serde_json::Value;

use crate::latch::Latch;

/// Renders an inbound tag field as a registry key.
///
/// Strings are used verbatim; every other JSON value uses its compact JSON
/// text (`7`, `true`, `null`, `{"a":1}`).
#[must_use]
pub fn tag_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Request/response latches keyed by command tag.
#[derive(Debug, Default)]
pub(crate) struct CommandRegistry {
    latches: HashMap<String, Latch>,
}

impl CommandRegistry {
    /// Auto-consuming edge poll; registers interest on first use.
    pub(crate) fn wait_for(&mut self, cmd: &str) -> bool {
        if let Some(latch) = self.latches.get_mut(cmd) {
            return latch.consume();
        }
        self.latches.insert(cmd.to_owned(), Latch::new());
        false
    }

    pub(crate) fn get(&self, cmd: &str) -> Option<&Latch> {
        self.latches.get(cmd)
    }

    /// Offers an inbound packet to the latch registered for `cmd`, if any.
    pub(crate) fn deliver(&mut self, cmd: &str, payload: &Value, sequence: usize) -> bool {
        self.latches
            .get_mut(cmd)
            .is_some_and(|latch| latch.offer(payload, sequence))
    }

    pub(crate) fn clear(&mut self) {
        self.latches.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.latches.len()
    }
}

/// Request/response latches keyed by command tag, then correlation id.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    listeners: HashMap<String, HashMap<String, Latch>>,
}

impl ListenerRegistry {
    /// Ensures a latch exists for `(cmd, id)`. Returns `true` when it was created.
    pub(crate) fn register(&mut self, cmd: &str, id: &str) -> bool {
        let by_id = self.listeners.entry(cmd.to_owned()).or_default();
        if by_id.contains_key(id) {
            return false;
        }
        by_id.insert(id.to_owned(), Latch::new());
        true
    }

    /// Ensures a latch exists for `(cmd, id)` with its flag lowered.
    pub(crate) fn arm(&mut self, cmd: &str, id: &str) -> bool {
        let created = self.register(cmd, id);
        if !created {
            self.reset(cmd, id);
        }
        created
    }

    pub(crate) fn reset(&mut self, cmd: &str, id: &str) {
        if let Some(latch) = self.latch_mut(cmd, id) {
            latch.reset();
        }
    }

    pub(crate) fn get(&self, cmd: &str, id: &str) -> Option<&Latch> {
        self.listeners.get(cmd).and_then(|by_id| by_id.get(id))
    }

    /// Offers an inbound packet to the latch registered for `(cmd, id)`, if any.
    pub(crate) fn deliver(
        &mut self,
        cmd: &str,
        id: &str,
        payload: &Value,
        sequence: usize,
    ) -> bool {
        self.latch_mut(cmd, id)
            .is_some_and(|latch| latch.offer(payload, sequence))
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    fn latch_mut(&mut self, cmd: &str, id: &str) -> Option<&mut Latch> {
        self.listeners
            .get_mut(cmd)
            .and_then(|by_id| by_id.get_mut(id))
    }
}
