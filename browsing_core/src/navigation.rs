// SPA navigation detection.
// popstate, history writes and DOM mutations all funnel into one URL comparison,
// so bursts of noise collapse into at most one navigation per actual URL change.

use crate::types::{ReadyState, Timestamp};

/// Read access to the page location. Provided by the host.
pub trait LocationProvider {
    fn href(&self) -> String;
    fn ready_state(&self) -> ReadyState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    PopState,
    /// `pushState`/`replaceState` already applied by the host.
    HistoryWrite,
    DomMutation,
}

/// A detected change of the logical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct NavigationHandler {
    current_url: String,
    check_delay_ms: u64,
    pending_check: Option<Timestamp>,
    attached: bool,
}

impl NavigationHandler {
    pub fn new(location: &impl LocationProvider, check_delay_ms: u64) -> Self {
        NavigationHandler {
            current_url: location.href(),
            check_delay_ms,
            pending_check: None,
            attached: true,
        }
    }

    pub fn handle(
        &mut self,
        signal: NavigationSignal,
        location: &impl LocationProvider,
        now: Timestamp,
    ) -> Option<Navigation> {
        if !self.attached {
            return None;
        }
        match signal {
            NavigationSignal::PopState => self.check_url_change(location),
            NavigationSignal::HistoryWrite => {
                // One deferred check covers every write queued before it runs.
                if self.pending_check.is_none() {
                    self.pending_check = Some(now.add_millis(self.check_delay_ms));
                }
                None
            }
            NavigationSignal::DomMutation => {
                // Mutations during the initial parse are not navigations.
                if location.ready_state() == ReadyState::Complete {
                    self.check_url_change(location)
                } else {
                    None
                }
            }
        }
    }

    /// Runs the deferred check scheduled by a history write, once due.
    pub fn poll(&mut self, location: &impl LocationProvider, now: Timestamp) -> Option<Navigation> {
        match self.pending_check {
            Some(due) if now >= due => {
                self.pending_check = None;
                self.check_url_change(location)
            }
            _ => None,
        }
    }

    pub fn check_url_change(&mut self, location: &impl LocationProvider) -> Option<Navigation> {
        let href = location.href();
        if href == self.current_url {
            return None;
        }
        let from = std::mem::replace(&mut self.current_url, href.clone());
        tracing::debug!(%from, to = %href, "logical URL changed");
        Some(Navigation { from, to: href })
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn deadline(&self) -> Option<Timestamp> {
        self.pending_check
    }

    pub fn destroy(&mut self) {
        self.pending_check = None;
        self.attached = false;
    }
}
