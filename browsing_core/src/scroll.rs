// Scroll depth and distance tracking.
// Wheel/touch gestures only signal activity; scroll events move the metrics.

use crate::types::{ScrollGeometry, ScrollMetrics};

/// Signal the tracker raises to its owner on each observed scroll input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUpdate {
    /// A scroll event moved the metrics.
    Scrolled,
    /// Wheel or touch-move without a scroll; metrics untouched.
    Gesture,
}

/// Tracks current depth, high-water depth and cumulative distance for one page view.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    metrics: ScrollMetrics,
    last_scroll_y: f64,
    attached: bool,
}

impl ScrollTracker {
    pub fn new(initial: &ScrollGeometry) -> Self {
        let depth = initial.depth_percent();
        ScrollTracker {
            metrics: ScrollMetrics {
                depth,
                max_depth: depth,
                total_distance: 0.0,
            },
            last_scroll_y: initial.scroll_y,
            attached: true,
        }
    }

    pub fn handle_scroll(&mut self, geometry: &ScrollGeometry) -> Option<ScrollUpdate> {
        if !self.attached {
            return None;
        }

        let delta = geometry.scroll_y - self.last_scroll_y;
        if delta.is_finite() {
            self.metrics.total_distance += delta.abs();
        }

        let depth = geometry.depth_percent();
        self.metrics.depth = depth;
        self.metrics.max_depth = self.metrics.max_depth.max(depth);
        self.last_scroll_y = geometry.scroll_y;

        Some(ScrollUpdate::Scrolled)
    }

    pub fn handle_gesture(&mut self) -> Option<ScrollUpdate> {
        self.attached.then_some(ScrollUpdate::Gesture)
    }

    /// Snapshot copy; the caller cannot reach internal state through it.
    pub fn metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    pub fn destroy(&mut self) {
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(scroll_y: f64) -> ScrollGeometry {
        ScrollGeometry {
            scroll_y,
            viewport_height: 500.0,
            body_scroll_height: 1800.0,
            document_scroll_height: 2000.0,
            ..Default::default()
        }
    }

    #[test]
    fn initial_depth_sets_high_water_mark() {
        let tracker = ScrollTracker::new(&at(500.0));
        let metrics = tracker.metrics();
        assert_eq!(metrics.depth, 50);
        assert_eq!(metrics.max_depth, 50);
        assert_eq!(metrics.total_distance, 0.0);
    }

    #[test]
    fn scrolling_back_keeps_max_depth() {
        let mut tracker = ScrollTracker::new(&at(0.0));
        assert_eq!(tracker.handle_scroll(&at(1500.0)), Some(ScrollUpdate::Scrolled));
        assert_eq!(tracker.handle_scroll(&at(100.0)), Some(ScrollUpdate::Scrolled));

        let metrics = tracker.metrics();
        assert_eq!(metrics.depth, 30);
        assert_eq!(metrics.max_depth, 100);
        assert_eq!(metrics.total_distance, 2900.0);
    }

    #[test]
    fn gesture_signals_without_touching_metrics() {
        let mut tracker = ScrollTracker::new(&at(0.0));
        let before = tracker.metrics();
        assert_eq!(tracker.handle_gesture(), Some(ScrollUpdate::Gesture));
        assert_eq!(tracker.metrics(), before);
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let tracker = ScrollTracker::new(&at(0.0));
        let mut snapshot = tracker.metrics();
        snapshot.max_depth = 99;
        snapshot.total_distance = 1e9;
        assert_eq!(snapshot.max_depth, 99);
        assert_eq!(tracker.metrics().max_depth, 25);
        assert_eq!(tracker.metrics().total_distance, 0.0);
    }

    #[test]
    fn destroyed_tracker_ignores_input() {
        let mut tracker = ScrollTracker::new(&at(0.0));
        tracker.destroy();
        assert_eq!(tracker.handle_scroll(&at(800.0)), None);
        assert_eq!(tracker.handle_gesture(), None);
        assert_eq!(tracker.metrics().total_distance, 0.0);
    }

    proptest! {
        #[test]
        fn max_depth_dominates_and_distance_never_shrinks(
            positions in prop::collection::vec(0.0f64..10_000.0, 1..60),
            height in 100.0f64..20_000.0,
        ) {
            let geo = |y: f64| ScrollGeometry {
                scroll_y: y,
                viewport_height: 700.0,
                document_offset_height: height,
                ..Default::default()
            };
            let mut tracker = ScrollTracker::new(&geo(0.0));
            let mut last_distance = 0.0;

            for y in positions {
                tracker.handle_scroll(&geo(y));
                let metrics = tracker.metrics();
                prop_assert!(metrics.max_depth >= metrics.depth);
                prop_assert!(metrics.depth <= 100);
                prop_assert!(metrics.total_distance >= last_distance);
                last_distance = metrics.total_distance;
            }
        }
    }
}
