// Author: Dustin Pilgrim
// License: MIT

/// Throttle gate for activity forwarding.
///
/// The first signal of a burst passes immediately; everything after it is
/// dropped until `interval_ms` has elapsed since the last forwarded one.
#[derive(Debug, Clone)]
pub struct ThrottleGate {
    interval_ms: u64,
    last_forwarded_ms: Option<u64>,
}

impl ThrottleGate {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_forwarded_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_closed(&self, now_ms: u64) -> bool {
        match self.last_forwarded_ms {
            Some(last) => now_ms.saturating_sub(last) < self.interval_ms,
            None => false,
        }
    }

    /// Returns true if the signal at `now_ms` should be forwarded,
    /// and closes the gate behind it.
    pub fn admit(&mut self, now_ms: u64) -> bool {
        if self.is_closed(now_ms) {
            return false;
        }
        self.last_forwarded_ms = Some(now_ms);
        true
    }

    /// Reopen immediately (used on detach).
    pub fn clear(&mut self) {
        self.last_forwarded_ms = None;
    }
}
