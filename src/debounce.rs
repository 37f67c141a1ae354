use std::time::{Duration, Instant};

/// Delay after the last edit before the ASCII output is regenerated.
pub const RECOMPUTE_DELAY: Duration = Duration::from_millis(35);

/// Coalesces bursts of edits into a single recompute once things go quiet.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(RECOMPUTE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Restarts the delay.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// `true` exactly once per quiet period.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left before the pending recompute, for scheduling a repaint.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
