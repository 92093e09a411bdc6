// One page view: owns the activity record and the four sub-trackers, routes
// their signals into the time tracker, and flushes snapshots on an interval.

use crate::host::ActivitySink;
use crate::idle::{IdleSignal, IdleTracker};
use crate::scroll::ScrollTracker;
use crate::time_tracker::TimeTracker;
use crate::types::{ActivityRecord, PageInfo, ScrollGeometry, Timestamp, TrackerConfig};
use crate::visibility::{VisibilityEdge, VisibilitySignal, VisibilityTracker};

pub struct ActivityRecorder {
    record: ActivityRecord,
    scroll: ScrollTracker,
    visibility: VisibilityTracker,
    idle: IdleTracker,
    time: TimeTracker,
    flush_interval_ms: u64,
    next_flush: Option<Timestamp>,
    finished: bool,
}

impl ActivityRecorder {
    pub fn new(
        page: &PageInfo,
        geometry: &ScrollGeometry,
        config: &TrackerConfig,
        now: Timestamp,
    ) -> Self {
        let scroll = ScrollTracker::new(geometry);
        let mut record = ActivityRecord::new(page, now);
        let initial = scroll.metrics();
        record.scroll_depth = initial.depth;
        record.max_scroll_depth = initial.max_depth;

        tracing::info!(url = %record.url, domain = %record.domain, "page view started");

        ActivityRecorder {
            record,
            scroll,
            visibility: VisibilityTracker::new(),
            idle: IdleTracker::new(config.idle_threshold_ms, now),
            time: TimeTracker::new(now),
            flush_interval_ms: config.flush_interval_ms,
            next_flush: Some(now.add_millis(config.flush_interval_ms)),
            finished: false,
        }
    }

    pub fn handle_scroll(&mut self, geometry: &ScrollGeometry, now: Timestamp) {
        if self.scroll.handle_scroll(geometry).is_some() {
            self.time.update_activity(now);
        }
    }

    /// Wheel or touch-move: liveness only.
    pub fn handle_gesture(&mut self, now: Timestamp) {
        if self.scroll.handle_gesture().is_some() {
            self.time.update_activity(now);
        }
    }

    pub fn handle_input(&mut self, now: Timestamp) {
        if let Some(IdleSignal::Active) = self.idle.handle_input(now) {
            self.time.mark_active(now);
        }
    }

    pub fn handle_visibility(&mut self, signal: VisibilitySignal, now: Timestamp) {
        match self.visibility.handle(signal) {
            Some(VisibilityEdge::Visible) => self.time.update_visibility(true, now),
            Some(VisibilityEdge::Hidden) => self.time.update_visibility(false, now),
            None => {}
        }
    }

    /// Fires whichever owned timers are due.
    pub fn poll(&mut self, now: Timestamp, sink: &mut impl ActivitySink) {
        if let Some(IdleSignal::Idle) = self.idle.poll(now) {
            tracing::debug!(url = %self.record.url, "user idle");
            self.time.mark_idle(now);
        }
        if matches!(self.next_flush, Some(due) if now >= due) {
            self.next_flush = Some(now.add_millis(self.flush_interval_ms));
            self.flush(now, sink);
        }
    }

    /// Rolls the open interval into the record and hands a snapshot to the sink.
    pub fn flush(&mut self, now: Timestamp, sink: &mut impl ActivitySink) {
        self.time.finalize(now);
        self.sync_metrics();
        tracing::debug!(
            url = %self.record.url,
            focus_ms = self.record.focus_time,
            idle_ms = self.record.idle_time,
            "flushing activity"
        );
        sink.submit(&self.record);
    }

    /// Teardown: stops the interval, detaches trackers, stamps `end_time`
    /// and performs the final flush. Later calls do nothing.
    pub fn finish(&mut self, now: Timestamp, sink: &mut impl ActivitySink) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.next_flush = None;
        self.scroll.destroy();
        self.visibility.destroy();
        self.idle.destroy();
        self.record.end_time = Some(now);
        self.flush(now, sink);
        tracing::info!(
            url = %self.record.url,
            focus_ms = self.record.focus_time,
            "page view finished"
        );
    }

    pub fn next_wakeup(&self) -> Option<Timestamp> {
        match (self.idle.deadline(), self.next_flush) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn record(&self) -> &ActivityRecord {
        &self.record
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn sync_metrics(&mut self) {
        let scroll = self.scroll.metrics();
        let time = self.time.metrics();
        let record = &mut self.record;
        record.scroll_depth = scroll.depth;
        record.max_scroll_depth = record.max_scroll_depth.max(scroll.max_depth);
        record.total_scroll_distance = record.total_scroll_distance.max(scroll.total_distance);
        record.focus_time = record.focus_time.max(time.focus_time);
        record.idle_time = record.idle_time.max(time.idle_time);
    }
}
