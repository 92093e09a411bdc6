// Strong typing over raw numbers. Newtypes for timestamps, records shared with JS.
// Field names on the wire are camelCase to match the extension's message schema.

use serde::{Deserialize, Serialize};

/// Wall-clock timestamp in epoch milliseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`. Zero if the clock went backwards.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn add_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_add(ms))
    }

    pub fn sub_millis(&self, ms: u64) -> Self {
        Timestamp(self.0.saturating_sub(ms))
    }
}

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn parse(value: &str) -> Self {
        match value {
            "complete" => ReadyState::Complete,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Loading,
        }
    }
}

/// Scroll position and document geometry, read from the page at event time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScrollGeometry {
    /// `window.scrollY`.
    pub scroll_y: f64,
    /// `window.innerHeight`.
    pub viewport_height: f64,
    pub body_scroll_height: f64,
    pub body_offset_height: f64,
    pub document_client_height: f64,
    pub document_scroll_height: f64,
    pub document_offset_height: f64,
}

impl ScrollGeometry {
    /// Largest of the height candidates. Layout quirks make any single one unreliable.
    pub fn document_height(&self) -> f64 {
        [
            self.body_scroll_height,
            self.body_offset_height,
            self.document_client_height,
            self.document_scroll_height,
            self.document_offset_height,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    /// Scroll depth percentage, clamped to 0-100.
    pub fn depth_percent(&self) -> u8 {
        let height = self.document_height();
        if height <= 0.0 {
            return 0;
        }
        let percent = ((self.scroll_y + self.viewport_height) / height * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

/// Identity of the viewed resource, captured when a page view begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
    pub domain: String,
}

/// Scroll metrics owned by the scroll tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub depth: u8,
    pub max_depth: u8,
    pub total_distance: f64,
}

/// Time metrics owned by the time tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimeMetrics {
    pub start_time: Timestamp,
    pub focus_time: u64,
    pub idle_time: u64,
    pub last_activity: Timestamp,
}

/// One logical page view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Stable key for this page view; stores replace rows that share it.
    #[serde(default)]
    pub view_id: String,
    pub url: String,
    pub title: String,
    pub domain: String,
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    pub scroll_depth: u8,
    pub max_scroll_depth: u8,
    pub total_scroll_distance: f64,
    pub focus_time: u64,
    pub idle_time: u64,
}

impl ActivityRecord {
    pub fn new(page: &PageInfo, start_time: Timestamp) -> Self {
        ActivityRecord {
            view_id: format!("{}@{}", page.url, start_time.as_millis()),
            url: page.url.clone(),
            title: page.title.clone(),
            domain: page.domain.clone(),
            start_time,
            end_time: None,
            scroll_depth: 0,
            max_scroll_depth: 0,
            total_scroll_distance: 0.0,
            focus_time: 0,
            idle_time: 0,
        }
    }

    /// Fraction of tracked visible time spent active. 0/0 counts as 0.
    pub fn engagement_ratio(&self) -> f64 {
        let tracked = self.focus_time.saturating_add(self.idle_time);
        if tracked == 0 {
            0.0
        } else {
            self.focus_time as f64 / tracked as f64
        }
    }
}

/// Normalized scoring factors, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InterestFactors {
    pub time_weight: f64,
    pub scroll_weight: f64,
    pub engagement_weight: f64,
}

/// Per-domain interest score. One row per domain, replaced on recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestScore {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub score: u8,
    pub factors: InterestFactors,
    pub last_updated: Timestamp,
}

/// Page-side tracker configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Quiet period before the user counts as idle.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_ms: u64,
    /// Interval between periodic snapshot flushes.
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,
    /// Delay between a history write and the URL check it schedules.
    #[serde(default)]
    pub navigation_check_delay_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            idle_threshold_ms: default_idle_threshold(),
            flush_interval_ms: default_flush_interval(),
            navigation_check_delay_ms: 0,
            log_level: default_log_level(),
        }
    }
}

fn default_idle_threshold() -> u64 {
    30_000 // 30s
}

fn default_flush_interval() -> u64 {
    30_000 // 30s
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Interest score formula constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Total focus time at which the time factor saturates.
    #[serde(default = "default_time_cap")]
    pub time_cap_ms: u64,
    /// How far back records count toward a domain's score.
    #[serde(default = "default_week")]
    pub lookback_ms: u64,
    #[serde(default = "default_time_coefficient")]
    pub time_coefficient: f64,
    #[serde(default = "default_scroll_coefficient")]
    pub scroll_coefficient: f64,
    #[serde(default = "default_engagement_coefficient")]
    pub engagement_coefficient: f64,
    /// Constant term standing in for visit frequency.
    #[serde(default = "default_frequency_term")]
    pub frequency_term: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            time_cap_ms: default_time_cap(),
            lookback_ms: default_week(),
            time_coefficient: default_time_coefficient(),
            scroll_coefficient: default_scroll_coefficient(),
            engagement_coefficient: default_engagement_coefficient(),
            frequency_term: default_frequency_term(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_time_cap() -> u64 {
    5 * 60 * 1000 // 5 minutes
}

fn default_week() -> u64 {
    7 * 24 * 60 * 60 * 1000
}

fn default_time_coefficient() -> f64 {
    0.3
}

fn default_scroll_coefficient() -> f64 {
    0.2
}

fn default_engagement_coefficient() -> f64 {
    0.3
}

fn default_frequency_term() -> f64 {
    0.2
}

fn default_multiplier() -> f64 {
    100.0
}

/// Background-side configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Default history search window when the request gives no start time.
    #[serde(default = "default_week")]
    pub history_window_ms: u64,
    #[serde(default = "default_history_max_results")]
    pub history_max_results: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        BackgroundConfig {
            scoring: ScoringConfig::default(),
            history_window_ms: default_week(),
            history_max_results: default_history_max_results(),
            log_level: default_log_level(),
        }
    }
}

fn default_history_max_results() -> u32 {
    100
}

/// Page event forwarded from the content script's DOM listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageEvent {
    MouseDown,
    MouseMove,
    KeyPress,
    TouchStart,
    Click,
    Scroll,
    Wheel,
    TouchMove,
    VisibilityChange { hidden: bool },
    Focus,
    Blur,
    PopState,
    /// Forwarded after the original `history.pushState` has run.
    PushState,
    /// Forwarded after the original `history.replaceState` has run.
    ReplaceState,
    DomMutation,
    BeforeUnload,
}

impl PageEvent {
    /// Events that count as user activity for idle detection.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            PageEvent::MouseDown
                | PageEvent::MouseMove
                | PageEvent::KeyPress
                | PageEvent::Scroll
                | PageEvent::TouchStart
                | PageEvent::Click
        )
    }
}
