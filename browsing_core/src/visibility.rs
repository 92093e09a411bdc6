// Page visibility from visibilitychange, focus and blur.
// All three sources feed one edge-triggered reducer; the last signal wins.

/// Raw visibility input from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilitySignal {
    VisibilityChange { hidden: bool },
    Focus,
    Blur,
}

/// Fired only when the visible flag actually flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEdge {
    Visible,
    Hidden,
}

#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    is_visible: bool,
    attached: bool,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        VisibilityTracker {
            is_visible: true,
            attached: true,
        }
    }

    pub fn handle(&mut self, signal: VisibilitySignal) -> Option<VisibilityEdge> {
        if !self.attached {
            return None;
        }
        match signal {
            VisibilitySignal::VisibilityChange { hidden } => self.set_visible(!hidden),
            VisibilitySignal::Focus => self.set_visible(true),
            VisibilitySignal::Blur => self.set_visible(false),
        }
    }

    fn set_visible(&mut self, visible: bool) -> Option<VisibilityEdge> {
        if self.is_visible == visible {
            return None;
        }
        self.is_visible = visible;
        Some(if visible {
            VisibilityEdge::Visible
        } else {
            VisibilityEdge::Hidden
        })
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn destroy(&mut self) {
        self.attached = false;
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_visible() {
        assert!(VisibilityTracker::new().is_visible());
    }

    #[test]
    fn repeated_blur_fires_hidden_once() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.handle(VisibilitySignal::Blur), Some(VisibilityEdge::Hidden));
        assert_eq!(tracker.handle(VisibilitySignal::Blur), None);
        assert!(!tracker.is_visible());
    }

    #[test]
    fn focus_overrides_hidden_document() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(
            tracker.handle(VisibilitySignal::VisibilityChange { hidden: true }),
            Some(VisibilityEdge::Hidden)
        );
        assert_eq!(tracker.handle(VisibilitySignal::Focus), Some(VisibilityEdge::Visible));
        assert!(tracker.is_visible());
    }

    #[test]
    fn visible_change_while_visible_is_silent() {
        let mut tracker = VisibilityTracker::new();
        assert_eq!(tracker.handle(VisibilitySignal::VisibilityChange { hidden: false }), None);
        assert_eq!(tracker.handle(VisibilitySignal::Focus), None);
    }

    #[test]
    fn destroyed_tracker_ignores_signals() {
        let mut tracker = VisibilityTracker::new();
        tracker.destroy();
        assert_eq!(tracker.handle(VisibilitySignal::Blur), None);
        assert!(tracker.is_visible());
    }
}
