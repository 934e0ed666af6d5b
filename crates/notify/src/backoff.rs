//! Exponential backoff between push channel connection attempts.

use std::time::Duration;

/// Stateful delay sequence: starts at `initial`, grows by `multiplier`
/// after each draw, clamps at `max`. Reset after a successful connection
/// so the next outage starts over from the short end.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            next: initial,
        }
    }

    /// The delay to wait before the next attempt. Advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        let grown_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        self.next = Duration::from_millis(grown_ms).min(self.max);
        current
    }

    /// Start over from the initial delay.
    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 2.0)
    }
}
