// Capabilities the embedding page must provide to the tracker graph.

use crate::navigation::LocationProvider;
use crate::types::{ActivityRecord, PageInfo, ScrollGeometry};

/// Everything the tracker reads from the page.
pub trait PageHost: LocationProvider {
    fn hostname(&self) -> String;
    fn title(&self) -> String;
    fn scroll_geometry(&self) -> ScrollGeometry;

    fn page_info(&self) -> PageInfo {
        PageInfo {
            url: self.href(),
            title: self.title(),
            domain: self.hostname(),
        }
    }
}

/// Receives flushed snapshots. Fire-and-forget: the tracker never learns
/// whether persistence succeeded and keeps accumulating either way.
pub trait ActivitySink {
    fn submit(&mut self, record: &ActivityRecord);
}

impl<F: FnMut(&ActivityRecord)> ActivitySink for F {
    fn submit(&mut self, record: &ActivityRecord) {
        self(record)
    }
}
