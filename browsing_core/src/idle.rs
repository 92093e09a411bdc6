// Idle detection over user input.
// One owned deadline stands in for the pending timeout; every input re-arms it.

use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleSignal {
    /// Raised on every qualifying input, even when already active.
    Active,
    /// Raised once the quiet period elapses with no input.
    Idle,
}

#[derive(Debug, Clone)]
pub struct IdleTracker {
    threshold_ms: u64,
    idle_deadline: Option<Timestamp>,
    attached: bool,
}

impl IdleTracker {
    /// Arms the first idle deadline immediately, as if the page load were input.
    pub fn new(threshold_ms: u64, now: Timestamp) -> Self {
        IdleTracker {
            threshold_ms,
            idle_deadline: Some(now.add_millis(threshold_ms)),
            attached: true,
        }
    }

    pub fn handle_input(&mut self, now: Timestamp) -> Option<IdleSignal> {
        if !self.attached {
            return None;
        }
        self.idle_deadline = Some(now.add_millis(self.threshold_ms));
        Some(IdleSignal::Active)
    }

    /// Fires the pending deadline if it is due. One-shot until the next input.
    pub fn poll(&mut self, now: Timestamp) -> Option<IdleSignal> {
        match self.idle_deadline {
            Some(deadline) if now >= deadline => {
                self.idle_deadline = None;
                Some(IdleSignal::Idle)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        self.idle_deadline
    }

    pub fn destroy(&mut self) {
        self.idle_deadline = None;
        self.attached = false;
    }
}
