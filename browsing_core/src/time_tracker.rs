// Focus/idle time accounting over two independent axes: visible and active.
// No timer lives here; every accumulation is driven by a call carrying `now`.
//
// Time is credited to `focus_time` only while visible AND active, and to
// `idle_time` only while visible AND idle. Hidden time is dropped from both,
// and `last_activity` is repositioned when the page becomes visible again.

use crate::types::{TimeMetrics, Timestamp};

#[derive(Debug, Clone)]
pub struct TimeTracker {
    metrics: TimeMetrics,
    is_active: bool,
    is_visible: bool,
}

impl TimeTracker {
    /// Starts visible and active, with the open focus interval beginning at `now`.
    pub fn new(now: Timestamp) -> Self {
        TimeTracker {
            metrics: TimeMetrics {
                start_time: now,
                focus_time: 0,
                idle_time: 0,
                last_activity: now,
            },
            is_active: true,
            is_visible: true,
        }
    }

    pub fn update_visibility(&mut self, visible: bool, now: Timestamp) {
        // Accounting reads the prior flags, so it runs before they change.
        match (self.is_visible, visible) {
            (true, false) => {
                if self.is_active {
                    self.credit_focus(now);
                }
                // Going hidden while idle closes nothing: idle time is only
                // credited on the idle -> active edge while visible.
            }
            (false, true) => {
                self.metrics.last_activity = now;
            }
            (true, true) | (false, false) => {}
        }
        self.is_visible = visible;
    }

    pub fn mark_active(&mut self, now: Timestamp) {
        if !self.is_active && self.is_visible {
            self.credit_idle(now);
            self.metrics.last_activity = now;
        }
        self.is_active = true;
    }

    pub fn mark_idle(&mut self, now: Timestamp) {
        if self.is_active && self.is_visible {
            self.credit_focus(now);
            self.metrics.last_activity = now;
        }
        self.is_active = false;
    }

    /// Liveness ping from continuous input (scroll, wheel). Moves the start of
    /// the open focus interval forward without crediting the elapsed span.
    pub fn update_activity(&mut self, now: Timestamp) {
        if self.is_visible && self.is_active {
            self.metrics.last_activity = now;
        }
    }

    /// Credits the open focus interval up to `now` and checkpoints
    /// `last_activity`, so repeated calls never count the same span twice.
    pub fn finalize(&mut self, now: Timestamp) {
        if self.is_visible && self.is_active {
            self.credit_focus(now);
            self.metrics.last_activity = now;
        }
    }

    pub fn metrics(&self) -> TimeMetrics {
        self.metrics
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    fn credit_focus(&mut self, now: Timestamp) {
        self.metrics.focus_time += now.millis_since(self.metrics.last_activity);
    }

    fn credit_idle(&mut self, now: Timestamp) {
        self.metrics.idle_time += now.millis_since(self.metrics.last_activity);
    }
}
