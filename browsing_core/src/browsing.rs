// Composition root for the content script. Builds the tracker graph once,
// routes page events into it, and swaps recorders on SPA navigation.

use crate::clock::Clock;
use crate::error::TrackerError;
use crate::host::{ActivitySink, PageHost};
use crate::navigation::{NavigationHandler, NavigationSignal};
use crate::recorder::ActivityRecorder;
use crate::types::{ActivityRecord, PageEvent, Timestamp, TrackerConfig};
use crate::visibility::VisibilitySignal;

pub struct BrowsingTracker<H, S, C> {
    config: TrackerConfig,
    host: H,
    sink: S,
    clock: C,
    navigation: Option<NavigationHandler>,
    recorder: Option<ActivityRecorder>,
}

impl<H: PageHost, S: ActivitySink, C: Clock> BrowsingTracker<H, S, C> {
    pub fn new(config: TrackerConfig, host: H, sink: S, clock: C) -> Self {
        BrowsingTracker {
            config,
            host,
            sink,
            clock,
            navigation: None,
            recorder: None,
        }
    }

    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.navigation.is_some() {
            return Err(TrackerError::AlreadyStarted);
        }
        let now = self.clock.now();
        self.navigation = Some(NavigationHandler::new(
            &self.host,
            self.config.navigation_check_delay_ms,
        ));
        self.begin_page_view(now);
        Ok(())
    }

    /// Finishes the current page view and detaches everything.
    pub fn stop(&mut self) {
        let now = self.clock.now();
        self.end_page_view(now);
        if let Some(mut navigation) = self.navigation.take() {
            navigation.destroy();
        }
    }

    pub fn is_running(&self) -> bool {
        self.navigation.is_some()
    }

    /// Due timers fire first, as they would have in the page's event loop.
    pub fn dispatch(&mut self, event: PageEvent) {
        let now = self.clock.now();
        self.poll_timers(now);
        match event {
            PageEvent::Scroll => {
                let geometry = self.host.scroll_geometry();
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.handle_scroll(&geometry, now);
                    recorder.handle_input(now);
                }
            }
            PageEvent::Wheel | PageEvent::TouchMove => {
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.handle_gesture(now);
                }
            }
            PageEvent::MouseDown
            | PageEvent::MouseMove
            | PageEvent::KeyPress
            | PageEvent::TouchStart
            | PageEvent::Click => {
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.handle_input(now);
                }
            }
            PageEvent::VisibilityChange { hidden } => {
                self.route_visibility(VisibilitySignal::VisibilityChange { hidden }, now)
            }
            PageEvent::Focus => self.route_visibility(VisibilitySignal::Focus, now),
            PageEvent::Blur => self.route_visibility(VisibilitySignal::Blur, now),
            PageEvent::PopState => self.route_navigation(NavigationSignal::PopState, now),
            PageEvent::PushState | PageEvent::ReplaceState => {
                self.route_navigation(NavigationSignal::HistoryWrite, now)
            }
            PageEvent::DomMutation => self.route_navigation(NavigationSignal::DomMutation, now),
            PageEvent::BeforeUnload => self.stop(),
        }
    }

    /// Fires due timers: idle timeout, periodic flush, deferred URL check.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.poll_timers(now);
    }

    fn poll_timers(&mut self, now: Timestamp) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.poll(now, &mut self.sink);
        }
        let navigated = self
            .navigation
            .as_mut()
            .and_then(|navigation| navigation.poll(&self.host, now));
        if navigated.is_some() {
            self.restart_page_view(now);
        }
    }

    /// Earliest pending deadline across all owned timers.
    pub fn next_wakeup(&self) -> Option<Timestamp> {
        let recorder = self.recorder.as_ref().and_then(ActivityRecorder::next_wakeup);
        let navigation = self.navigation.as_ref().and_then(NavigationHandler::deadline);
        match (recorder, navigation) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn current_record(&self) -> Option<&ActivityRecord> {
        self.recorder.as_ref().map(ActivityRecorder::record)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn route_visibility(&mut self, signal: VisibilitySignal, now: Timestamp) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.handle_visibility(signal, now);
        }
    }

    fn route_navigation(&mut self, signal: NavigationSignal, now: Timestamp) {
        let navigated = self
            .navigation
            .as_mut()
            .and_then(|navigation| navigation.handle(signal, &self.host, now));
        if navigated.is_some() {
            self.restart_page_view(now);
        }
    }

    /// The old recorder is fully finished before the new one exists.
    fn restart_page_view(&mut self, now: Timestamp) {
        self.end_page_view(now);
        self.begin_page_view(now);
    }

    fn begin_page_view(&mut self, now: Timestamp) {
        let page = self.host.page_info();
        let geometry = self.host.scroll_geometry();
        self.recorder = Some(ActivityRecorder::new(&page, &geometry, &self.config, now));
    }

    fn end_page_view(&mut self, now: Timestamp) {
        if let Some(mut recorder) = self.recorder.take() {
            recorder.finish(now, &mut self.sink);
        }
    }
}
