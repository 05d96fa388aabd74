//! One-shot edge detector used for the connect, packet and close notifications.

/// Fires once when polled with a true condition, then stays quiet until re-armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlag {
    fired: bool,
}

impl EventFlag {
    /// Creates an armed flag.
    #[must_use]
    pub const fn new() -> Self {
        Self { fired: false }
    }

    /// Returns `true` exactly once per arming, the first time `condition` holds.
    pub const fn poll(&mut self, condition: bool) -> bool {
        if !self.fired && condition {
            self.fired = true;
            return true;
        }
        false
    }

    /// Arms the flag so the next satisfied poll fires again.
    pub const fn rearm(&mut self) {
        self.fired = false;
    }

    /// Returns whether the flag has fired since it was last armed.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn fires_once_while_condition_holds() {
        let mut flag = EventFlag::new();

        assert!(flag.poll(true));
        assert!(!flag.poll(true));
        assert!(!flag.poll(true));
    }

    #[rstest]
    fn stays_armed_while_condition_is_false() {
        let mut flag = EventFlag::new();

        assert!(!flag.poll(false));
        assert!(!flag.has_fired());
        assert!(flag.poll(true));
    }

    #[rstest]
    fn fires_again_after_rearm() {
        let mut flag = EventFlag::new();
        flag.poll(true);
        flag.rearm();

        assert!(flag.poll(true));
    }
}
