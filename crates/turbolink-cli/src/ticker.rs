//! Fixed-rate host loop.
//!
//! The link never blocks, so the binary behaves like a cooperative scheduler:
//! it calls a step function once per tick and sleeps for the configured
//! interval in between.

use std::thread;
use std::time::Duration;

use tracing::trace;

/// Steps a closure at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticker {
    interval: Duration,
    max_ticks: Option<u64>,
}

impl Ticker {
    pub(crate) const fn new(interval: Duration, max_ticks: Option<u64>) -> Self {
        Self {
            interval,
            max_ticks,
        }
    }

    /// Runs `step` until it yields a value or the tick budget is spent.
    ///
    /// `step` always runs at least once, and the loop never sleeps after the
    /// final permitted tick.
    pub(crate) fn run_until<T>(&self, mut step: impl FnMut(u64) -> Option<T>) -> Option<T> {
        let mut tick = 0_u64;
        loop {
            if let Some(value) = step(tick) {
                trace!(target: crate::CLI_TARGET, tick, "tick loop finished");
                return Some(value);
            }
            tick = tick.saturating_add(1);
            if self.max_ticks.is_some_and(|limit| tick >= limit) {
                trace!(target: crate::CLI_TARGET, tick, "tick budget spent");
                return None;
            }
            thread::sleep(self.interval);
        }
    }
}
